/// Per-context tuning.
///
/// `from_env` reads `GFX_D2D_VERBOSE` and `GFX_D2D_DISABLE_LAYERS`; both accept `1` or `true`.
#[derive(Clone, Debug, PartialEq)]
pub struct D2DContextConfig {
    /// Emit per-call composition traces.
    pub verbose_logging: bool,
    /// Miter limit of every stroke style the context creates.
    pub miter_limit: f32,
    /// Clip rotated draws through a layer. When off, rotated draws use the axis-aligned clip
    /// like any other call.
    pub rotated_clip_layers: bool,
}

impl Default for D2DContextConfig {
    fn default() -> Self {
        Self {
            verbose_logging: false,
            miter_limit: 10.0,
            rotated_clip_layers: true,
        }
    }
}

impl D2DContextConfig {
    pub fn from_env() -> Self {
        Self {
            verbose_logging: env_flag("GFX_D2D_VERBOSE"),
            rotated_clip_layers: !env_flag("GFX_D2D_DISABLE_LAYERS"),
            ..Self::default()
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| parse_flag(&v))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = D2DContextConfig::default();
        assert!(!config.verbose_logging);
        assert!(config.rotated_clip_layers);
        assert_eq!(config.miter_limit, 10.0);
    }

    #[test]
    fn flag_values() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("true"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("yes"));
        assert!(!parse_flag(""));
    }
}
