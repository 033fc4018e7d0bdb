/// Run-wide switches for the trace pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TraceConfig {
    /// Keep flushed (misspeculated) lifecycles in the output.
    pub verbose: bool,
    /// Decode instruction bytes with the RoCC accelerator table instead of
    /// handing them to the disassembler as `DASM(..)` tokens.
    pub rocc_decode: bool,
}

impl TraceConfig {
    /// Sets [`TraceConfig::verbose`].
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Sets [`TraceConfig::rocc_decode`].
    #[must_use]
    pub const fn with_rocc_decode(mut self, rocc_decode: bool) -> Self {
        self.rocc_decode = rocc_decode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::TraceConfig;

    #[test]
    fn default_config_is_quiet_and_uses_disassembler() {
        let config = TraceConfig::default();
        assert!(!config.verbose);
        assert!(!config.rocc_decode);
    }

    #[test]
    fn builders_set_flags() {
        let config = TraceConfig::default()
            .with_verbose(true)
            .with_rocc_decode(true);
        assert_eq!(
            config,
            TraceConfig {
                verbose: true,
                rocc_decode: true
            }
        );
    }
}
