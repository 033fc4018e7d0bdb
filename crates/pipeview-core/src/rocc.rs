//! RoCC command words and the accelerator's function-code table.
//!
//! A command travels as one combined value laid out as
//! `[rs1:64][rs2:64][inst:32]`, with the instruction word in the least
//! significant bits. The 7-bit function code sits in `inst[31:25]`.

use std::fmt;

use crate::decoder::FieldLayout;

const INST_HEX_DIGITS: usize = 8;
const REG_HEX_DIGITS: usize = 16;
const COMMAND_HEX_DIGITS: usize = INST_HEX_DIGITS + 2 * REG_HEX_DIGITS;

/// One custom instruction with its two source operand registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RoccCommand {
    /// 32-bit instruction word.
    pub inst: u32,
    /// First source register value.
    pub rs1: u64,
    /// Second source register value.
    pub rs2: u64,
}

impl RoccCommand {
    /// Creates a command from its parts.
    #[must_use]
    pub const fn new(inst: u32, rs1: u64, rs2: u64) -> Self {
        Self { inst, rs1, rs2 }
    }

    /// Extracts the 7-bit function code from `inst[31:25]`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn funct(self) -> u8 {
        ((self.inst >> 25) & 0x7F) as u8
    }

    /// True when neither operand register carries data.
    #[must_use]
    pub const fn operands_are_zero(self) -> bool {
        self.rs1 == 0 && self.rs2 == 0
    }

    /// Unpacks a combined hex value (optionally `0x`-prefixed).
    ///
    /// Digits above bit 160 are discarded. Returns `None` for empty or
    /// non-hex input.
    #[must_use]
    pub fn from_hex(text: &str) -> Option<Self> {
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let digits = &digits[digits.len().saturating_sub(COMMAND_HEX_DIGITS)..];
        let (rest, inst) = split_low(digits, INST_HEX_DIGITS);
        let (rest, rs2) = split_low(rest, REG_HEX_DIGITS);
        let (_, rs1) = split_low(rest, REG_HEX_DIGITS);

        Some(Self {
            inst: u32::from_str_radix(inst, 16).ok()?,
            rs2: u64::from_str_radix(rs2, 16).ok()?,
            rs1: u64::from_str_radix(rs1, 16).ok()?,
        })
    }
}

/// Splits off the lowest `count` hex digits. Empty fields read as zero.
fn split_low(digits: &str, count: usize) -> (&str, &str) {
    let at = digits.len().saturating_sub(count);
    let (high, low) = digits.split_at(at);
    (high, if low.is_empty() { "0" } else { low })
}

/// Renders the combined value with the minimal number of hex digits.
impl fmt::Display for RoccCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rs1 != 0 {
            write!(f, "{:#x}{:016x}{:08x}", self.rs1, self.rs2, self.inst)
        } else if self.rs2 != 0 {
            write!(f, "{:#x}{:08x}", self.rs2, self.inst)
        } else {
            write!(f, "{:#x}", self.inst)
        }
    }
}

/// Accelerator function codes with assigned semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Funct {
    Config,
    Mvin2,
    Mvin,
    Mvout,
    ComputePreloaded,
    ComputeAccumulate,
    Preload,
    Flush,
    LoopWs,
    LoopWsConfigBounds,
    LoopWsConfigAddrsAb,
    LoopWsConfigAddrsDc,
    LoopWsConfigStridesAb,
    LoopWsConfigStridesDc,
    Mvin3,
    LoopConvWs,
    LoopConvWsConfig1,
    LoopConvWsConfig2,
    LoopConvWsConfig3,
    LoopConvWsConfig4,
    LoopConvWsConfig5,
    LoopConvWsConfig6,
    Counter,
}

/// Single source-of-truth function code table.
///
/// Any code not present here decodes as a raw value.
pub const FUNCT_TABLE: &[(u8, Funct)] = &[
    (0, Funct::Config),
    (1, Funct::Mvin2),
    (2, Funct::Mvin),
    (3, Funct::Mvout),
    (4, Funct::ComputePreloaded),
    (5, Funct::ComputeAccumulate),
    (6, Funct::Preload),
    (7, Funct::Flush),
    (8, Funct::LoopWs),
    (9, Funct::LoopWsConfigBounds),
    (10, Funct::LoopWsConfigAddrsAb),
    (11, Funct::LoopWsConfigAddrsDc),
    (12, Funct::LoopWsConfigStridesAb),
    (13, Funct::LoopWsConfigStridesDc),
    (14, Funct::Mvin3),
    (15, Funct::LoopConvWs),
    (16, Funct::LoopConvWsConfig1),
    (17, Funct::LoopConvWsConfig2),
    (18, Funct::LoopConvWsConfig3),
    (19, Funct::LoopConvWsConfig4),
    (20, Funct::LoopConvWsConfig5),
    (21, Funct::LoopConvWsConfig6),
    (126, Funct::Counter),
];

/// Looks up the function assigned to a 7-bit code.
#[must_use]
pub fn classify_funct(code: u8) -> Option<Funct> {
    FUNCT_TABLE
        .iter()
        .find_map(|(entry, funct)| (*entry == code).then_some(*funct))
}

impl Funct {
    /// Mnemonic printed in the trace.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Config => "k_CONFIG",
            Self::Mvin2 => "k_MVIN2",
            Self::Mvin => "k_MVIN",
            Self::Mvout => "k_MVOUT",
            Self::ComputePreloaded => "k_COMPUTE_PRELOADED",
            Self::ComputeAccumulate => "k_COMPUTE_ACCUMULATE",
            Self::Preload => "k_PRELOAD",
            Self::Flush => "k_FLUSH",
            Self::LoopWs => "k_LOOP_WS",
            Self::LoopWsConfigBounds => "k_LOOP_WS_CONFIG_BOUNDS",
            Self::LoopWsConfigAddrsAb => "k_LOOP_WS_CONFIG_ADDRS_AB",
            Self::LoopWsConfigAddrsDc => "k_LOOP_WS_CONFIG_ADDRS_DC",
            Self::LoopWsConfigStridesAb => "k_LOOP_WS_CONFIG_STRIDES_AB",
            Self::LoopWsConfigStridesDc => "k_LOOP_WS_CONFIG_STRIDES_DC",
            Self::Mvin3 => "k_MVIN3",
            Self::LoopConvWs => "k_LOOP_CONV_WS",
            Self::LoopConvWsConfig1 => "k_LOOP_CONV_WS_CONFIG_1",
            Self::LoopConvWsConfig2 => "k_LOOP_CONV_WS_CONFIG_2",
            Self::LoopConvWsConfig3 => "k_LOOP_CONV_WS_CONFIG_3",
            Self::LoopConvWsConfig4 => "k_LOOP_CONV_WS_CONFIG_4",
            Self::LoopConvWsConfig5 => "k_LOOP_CONV_WS_CONFIG_5",
            Self::LoopConvWsConfig6 => "k_LOOP_CONV_WS_CONFIG_6",
            Self::Counter => "k_COUNTER",
        }
    }

    /// How `rs1`/`rs2` are sliced for this function.
    #[must_use]
    pub const fn layout(self) -> FieldLayout {
        match self {
            Self::Config => FieldLayout::Config,
            Self::Mvin2 | Self::Mvin | Self::Mvin3 => FieldLayout::Move { verb: "loaded" },
            Self::Mvout => FieldLayout::Move { verb: "stored" },
            Self::ComputePreloaded | Self::ComputeAccumulate => FieldLayout::LocalPair {
                rs1: "A",
                rs2: "D/B",
            },
            Self::Preload => FieldLayout::LocalPair {
                rs1: "D/B",
                rs2: "C",
            },
            Self::Flush => FieldLayout::TlbFlush,
            Self::LoopWs => FieldLayout::LoopFlags,
            Self::LoopWsConfigBounds => FieldLayout::Packed16 {
                rs1: ("Padding", &["I", "J", "K"]),
                rs2: ("Addresses", &["I", "J", "K"]),
            },
            Self::LoopWsConfigAddrsAb => FieldLayout::AddressPair {
                rs1: "A addr",
                rs2: "B addr",
            },
            Self::LoopWsConfigAddrsDc => FieldLayout::AddressPair {
                rs1: "D addr",
                rs2: "C addr",
            },
            Self::LoopWsConfigStridesAb => FieldLayout::CountPair {
                rs1: "A stride",
                rs2: "B stride",
            },
            Self::LoopWsConfigStridesDc => FieldLayout::CountPair {
                rs1: "D stride",
                rs2: "C stride",
            },
            Self::LoopConvWs => FieldLayout::ConvConfig(0),
            Self::LoopConvWsConfig1 => FieldLayout::ConvConfig(1),
            Self::LoopConvWsConfig2 => FieldLayout::ConvConfig(2),
            Self::LoopConvWsConfig3 => FieldLayout::ConvConfig(3),
            Self::LoopConvWsConfig4 => FieldLayout::ConvConfig(4),
            Self::LoopConvWsConfig5 => FieldLayout::ConvConfig(5),
            Self::LoopConvWsConfig6 => FieldLayout::ConvConfig(6),
            Self::Counter => FieldLayout::RawWords,
        }
    }
}
