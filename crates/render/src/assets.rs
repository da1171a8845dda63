//! Embedded template assets.
//!
//! Template markup is embedded into the binary at compile time using
//! [`rust-embed`](rust_embed), so a deployment carries its fragment markup
//! with it instead of reading template files at runtime.

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use rust_embed::Embed;
use std::borrow::Cow;

#[derive(Embed)]
#[folder = "../../assets/templates/"]
pub struct Templates;
impl Templates {
    /// Get the source for an embedded template by name.
    pub fn load(name: impl AsRef<str>) -> Result<String> {
        let raw = Self::get(name.as_ref())
            .map(|f| f.data)
            .ok_or_raise(|| ErrorKind::AssetNotFound(name.as_ref().to_string()))?;
        match raw {
            Cow::Borrowed(bytes) => str::from_utf8(bytes).map(str::to_string),
            Cow::Owned(ref bytes) => str::from_utf8(bytes).map(str::to_string),
        }
        .or_raise(|| ErrorKind::AssetNotFound(name.as_ref().to_string()))
    }

    /// List all available template names.
    pub fn list() -> Vec<Cow<'static, str>> {
        Self::iter().filter(|f| f.ends_with(".html")).collect()
    }

    pub fn exists(name: impl AsRef<str>) -> bool {
        Self::get(name.as_ref()).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_load_item_template() {
        let src = Templates::load("item.html");
        assert!(src.is_ok());
        assert!(!src.unwrap().is_empty());
    }

    #[test]
    fn list_includes_all_fragment_kinds() {
        for name in ["home.html", "page.html", "item.html"] {
            assert!(Templates::exists(name), "{name} should be embedded");
        }
        let templates = Templates::list();
        assert!(templates.iter().any(|t| t == "page.html"));
    }

    #[test]
    fn missing_template_is_an_error() {
        let err = Templates::load("nope.html").unwrap_err();
        assert!(matches!(&*err, ErrorKind::AssetNotFound(_)));
    }
}
