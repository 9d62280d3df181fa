//! Hydration payload serialization and manifest-derived asset tags.

use serde_json::Value;

use crate::plugin::context::SsrData;

/// Tags derived from the client manifest.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AssetTags {
    /// Stylesheet links, injected into the head.
    pub styles: String,
    /// Script tags, injected at the end of the body.
    pub scripts: String,
}

/// Build asset tags for the manifest's initial chunks.
///
/// Accepts both `publicPath` and `public_path` spellings so manifests from
/// different bundlers work unchanged.
pub fn asset_tags(manifest: &Value) -> AssetTags {
    let public_path = manifest
        .get("publicPath")
        .or_else(|| manifest.get("public_path"))
        .and_then(Value::as_str)
        .unwrap_or("/");

    let mut tags = AssetTags::default();
    let Some(initial) = manifest.get("initial").and_then(Value::as_array) else {
        return tags;
    };

    for asset in initial.iter().filter_map(Value::as_str) {
        let url = join_public(public_path, asset);
        if asset.ends_with(".css") {
            tags.styles
                .push_str(&format!("<link rel=\"stylesheet\" href=\"{}\">", url));
        } else if asset.ends_with(".js") {
            tags.scripts
                .push_str(&format!("<script src=\"{}\" defer></script>", url));
        }
    }
    tags
}

/// Serialize the payload into a script tag assigning the hydration global.
///
/// `<` is escaped so payload content can never terminate the script tag.
pub fn hydration_script(global: &str, ssr: &SsrData) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(&Value::Object(ssr.data.clone()))?;
    let safe = json.replace('<', "\\u003c");
    Ok(format!("<script>window.{} = {};</script>", global, safe))
}

fn join_public(public_path: &str, asset: &str) -> String {
    let prefix = public_path.trim_end_matches('/');
    let suffix = asset.trim_start_matches('/');
    format!("{}/{}", prefix, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn initial_assets_become_tags() {
        let manifest = json!({
            "publicPath": "/assets/",
            "initial": ["app.js", "vendor.js", "app.css"],
        });

        let tags = asset_tags(&manifest);

        assert_eq!(
            tags.styles,
            "<link rel=\"stylesheet\" href=\"/assets/app.css\">"
        );
        assert!(tags.scripts.contains("src=\"/assets/app.js\""));
        assert!(tags.scripts.contains("src=\"/assets/vendor.js\""));
    }

    #[test]
    fn manifest_without_initial_yields_empty_tags() {
        assert_eq!(asset_tags(&json!({})), AssetTags::default());
        assert_eq!(asset_tags(&json!(null)), AssetTags::default());
    }

    #[test]
    fn snake_case_public_path_accepted() {
        let manifest = json!({
            "public_path": "/static",
            "initial": ["main.js"],
        });

        let tags = asset_tags(&manifest);
        assert!(tags.scripts.contains("src=\"/static/main.js\""));
    }

    #[test]
    fn payload_assigns_global() {
        let mut ssr = SsrData::default();
        ssr.set("state", json!({ "ready": true }));

        let script = hydration_script("__DATA__", &ssr).unwrap();

        assert_eq!(
            script,
            "<script>window.__DATA__ = {\"state\":{\"ready\":true}};</script>"
        );
    }
}
