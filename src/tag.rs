use std::collections::HashMap;

/// Identifies the origin of a log call.
///
/// The logging macros fill in `module_path!()` of the call site. A call may
/// also carry an explicit tag, which wins over whatever the provider derives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Caller<'a> {
    pub module_path: &'a str,
    pub tag: Option<&'a str>,
}

impl<'a> Caller<'a> {
    pub fn new(module_path: &'a str) -> Self {
        Self {
            module_path,
            tag: None,
        }
    }

    pub fn tagged(tag: &'a str) -> Self {
        Self {
            module_path: "",
            tag: Some(tag),
        }
    }

    pub fn with_tag(self, tag: &'a str) -> Self {
        Self {
            tag: Some(tag),
            ..self
        }
    }
}

/// Derives the tag of a log line from its caller.
pub trait TagProvider: Send + Sync {
    fn tag(&self, caller: &Caller<'_>) -> String;
}

impl<F> TagProvider for F
where
    F: Fn(&Caller<'_>) -> String + Send + Sync,
{
    fn tag(&self, caller: &Caller<'_>) -> String {
        self(caller)
    }
}

/// Tags lines with the last segment of the caller's module path, so
/// `my_app::net::client` logs as `client`.
///
/// Aliases override the derived tag for a module and everything below it;
/// the most specific alias wins.
#[derive(Debug, Clone, Default)]
pub struct ModuleTagProvider {
    aliases: HashMap<String, String>,
}

impl ModuleTagProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alias(mut self, module_path: impl Into<String>, tag: impl Into<String>) -> Self {
        self.aliases.insert(module_path.into(), tag.into());
        self
    }

    fn alias(&self, module_path: &str) -> Option<&str> {
        let mut path = module_path;
        loop {
            if let Some(tag) = self.aliases.get(path) {
                return Some(tag);
            }
            path = &path[..path.rfind("::")?];
        }
    }
}

impl TagProvider for ModuleTagProvider {
    fn tag(&self, caller: &Caller<'_>) -> String {
        if let Some(tag) = self.alias(caller.module_path) {
            return tag.to_string();
        }
        let path = caller.module_path;
        path.rsplit("::").next().unwrap_or(path).to_string()
    }
}

/// Gives every line the same tag.
#[derive(Debug, Clone, Default)]
pub struct FixedTagProvider(pub String);

impl TagProvider for FixedTagProvider {
    fn tag(&self, _caller: &Caller<'_>) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn last_module_segment_is_the_tag() {
        let provider = ModuleTagProvider::new();
        assert_eq!(provider.tag(&Caller::new("my_app::net::client")), "client");
        assert_eq!(provider.tag(&Caller::new("my_app")), "my_app");
        assert_eq!(provider.tag(&Caller::new("")), "");
    }

    #[test]
    fn aliases_cover_submodules() {
        let provider = ModuleTagProvider::new()
            .with_alias("my_app::net", "Net")
            .with_alias("my_app::net::tls", "Tls");

        assert_eq!(provider.tag(&Caller::new("my_app::net")), "Net");
        assert_eq!(provider.tag(&Caller::new("my_app::net::client")), "Net");
        assert_eq!(provider.tag(&Caller::new("my_app::net::tls::handshake")), "Tls");
        assert_eq!(provider.tag(&Caller::new("my_app::disk")), "disk");
        assert_eq!(provider.tag(&Caller::new("my_app::network")), "network");
    }

    fn shout(caller: &Caller<'_>) -> String {
        caller.module_path.to_uppercase()
    }

    #[test]
    fn functions_are_providers() {
        assert_eq!(shout.tag(&Caller::new("a::b")), "A::B");
    }

    #[test]
    fn fixed_provider_ignores_caller() {
        let provider = FixedTagProvider("cli".to_string());
        assert_eq!(provider.tag(&Caller::new("a::b")), "cli");
    }

    #[test]
    fn explicit_tag_is_carried() {
        let caller = Caller::new("a::b").with_tag("Explicit");
        assert_eq!(caller.tag, Some("Explicit"));
        assert_eq!(Caller::tagged("T").module_path, "");
    }
}
