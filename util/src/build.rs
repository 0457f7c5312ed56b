//! Build metadata stamped in by `vergen`.

macro_rules! env_or_none {
    ($name:ident, $env:literal) => {
        pub const $name: &str = match option_env!($env) {
            Some(value) => value,
            None => "<none>",
        };
    };
}

pub const PACKAGE: &str = "zwlink";
env_or_none!(VERSION, "VERGEN_BUILD_SEMVER");
env_or_none!(BUILD_TIMESTAMP, "VERGEN_BUILD_TIMESTAMP");
env_or_none!(RUSTC_SEMVER, "VERGEN_RUSTC_SEMVER");
env_or_none!(RUSTC_COMMIT_HASH, "VERGEN_RUSTC_COMMIT_HASH");

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stamped() {
        assert_eq!("zwlink", PACKAGE);
        assert!(!VERSION.is_empty());
        assert!(!RUSTC_SEMVER.is_empty());
    }
}
