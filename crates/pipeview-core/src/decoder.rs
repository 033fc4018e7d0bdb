//! Bitfield decoder for accelerator RoCC commands.
//!
//! Every [`Funct`] carries a [`FieldLayout`] describing how its operand
//! registers are sliced; [`Decoder::decode`] dispatches on that layout with a
//! single match. Addresses and packed fields render as lowercase `0x…` hex,
//! flags and counts as decimal.

use std::fmt;

use crate::rocc::{classify_funct, Funct, RoccCommand};

/// Operand slicing rule attached to a function code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLayout {
    /// Sub-mode in `rs1[1:0]` selects the config record.
    Config,
    /// `rs1` is a DRAM address; `rs2` packs local address, columns, rows.
    Move {
        /// Past-tense verb describing the transfer direction.
        verb: &'static str,
    },
    /// Both words pack a local address with column and row counts.
    LocalPair {
        /// Operand name for `rs1`.
        rs1: &'static str,
        /// Operand name for `rs2`.
        rs2: &'static str,
    },
    /// `rs1` bit 0 says whether the TLB request is skipped.
    TlbFlush,
    /// Activation code plus single-bit loop flags.
    LoopFlags,
    /// Up to four 16-bit fields per word, ascending bit position.
    Packed16 {
        /// Heading and field names for `rs1`.
        rs1: (&'static str, &'static [&'static str]),
        /// Heading and field names for `rs2`.
        rs2: (&'static str, &'static [&'static str]),
    },
    /// Each word is one full-width address.
    AddressPair {
        /// Label for `rs1`.
        rs1: &'static str,
        /// Label for `rs2`.
        rs2: &'static str,
    },
    /// Each word is one full-width count, rendered in decimal.
    CountPair {
        /// Label for `rs1`.
        rs1: &'static str,
        /// Label for `rs2`.
        rs2: &'static str,
    },
    /// Convolution loop configuration; index `0..=6` selects the word layouts.
    ConvConfig(u8),
    /// Both words unparsed.
    RawWords,
}

const STATIONARY_TYPES: [&str; 2] = ["OUTPUT_STATIONARY", "WEIGHT_STATIONARY"];

const ACTIVATION_TYPES: [&str; 5] = ["NO_ACTIVATION", "RELU", "LAYERNORM", "IGELU", "SOFTMAX"];

const CONV_RS1_LAYOUTS: [&[&str]; 7] = [
    &["RS1"],
    &["Output Channels", "Input Channels", "IN DIM", "BATCH SIZE"],
    &["Kernel DIM", "Pool Size", "Stride", "Pad"],
    &["K Rows", "K Cols", "K Chs", "L PAD"],
    &["O Rows", "O Cols", "P UPAD", "P DPAD"],
    &["Weights"],
    &["Bias"],
];

const CONV_RS2_LAYOUTS: [&[&str]; 7] = [
    &["RS2"],
    &["Padding", "Stride", "Pool Out DIM", "Out DIM"],
    &["Batches", "P Rows", "P Cols", "P Chs"],
    &["R Pad", "U Pad", "D Pad", "PL Pad"],
    &["Kernel Dilation", "O Cols"],
    &["Output"],
    &["Input"],
];

const fn bits(word: u64, lo: u32, width: u32) -> u64 {
    (word >> lo) & ((1u64 << width) - 1)
}

fn activation_name(code: u64) -> String {
    usize::try_from(code)
        .ok()
        .and_then(|idx| ACTIVATION_TYPES.get(idx))
        .map_or_else(|| format!("ACTIVATION_{code}"), |name| (*name).to_string())
}

/// Result of decoding one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedCommand {
    /// Known function with both operands zero.
    Bare(Funct),
    /// Known function with rendered operand fields.
    Fields {
        /// Decoded function.
        funct: Funct,
        /// Rendered field list.
        fields: String,
    },
    /// Function code outside the table; the command passes through.
    Raw(RoccCommand),
}

impl DecodedCommand {
    /// Returns the decoded function, if the code was known.
    #[must_use]
    pub const fn funct(&self) -> Option<Funct> {
        match self {
            Self::Bare(funct) | Self::Fields { funct, .. } => Some(*funct),
            Self::Raw(_) => None,
        }
    }
}

impl fmt::Display for DecodedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bare(funct) => f.write_str(funct.mnemonic()),
            Self::Fields { funct, fields } => write!(f, "{} {fields}", funct.mnemonic()),
            Self::Raw(cmd) => write!(f, "{cmd}"),
        }
    }
}

/// Stateless RoCC command decoder.
pub struct Decoder;

impl Decoder {
    /// Decodes a command by its function code.
    #[must_use]
    pub fn decode(cmd: RoccCommand) -> DecodedCommand {
        let Some(funct) = classify_funct(cmd.funct()) else {
            return DecodedCommand::Raw(cmd);
        };

        if cmd.operands_are_zero() {
            return DecodedCommand::Bare(funct);
        }

        DecodedCommand::Fields {
            funct,
            fields: render_fields(funct.layout(), cmd.rs1, cmd.rs2),
        }
    }

    /// Decodes a hex-encoded combined value as found in an event's data.
    ///
    /// Text that is not hex, or carries an unknown function code, is returned
    /// unchanged.
    #[must_use]
    pub fn decode_hex(data: &str) -> String {
        match RoccCommand::from_hex(data).map(Self::decode) {
            Some(DecodedCommand::Raw(_)) | None => data.to_string(),
            Some(decoded) => decoded.to_string(),
        }
    }
}

/// Renders `rs1`/`rs2` according to `layout`.
#[must_use]
pub fn render_fields(layout: FieldLayout, rs1: u64, rs2: u64) -> String {
    match layout {
        FieldLayout::Config => render_config(rs1, rs2),
        FieldLayout::Move { verb } => format!(
            "DRAM addr: {rs1:#x}, Scratchpad addr: {:#x}, {} cols {verb}, {} rows {verb}",
            bits(rs2, 0, 32),
            bits(rs2, 32, 16),
            bits(rs2, 48, 16),
        ),
        FieldLayout::LocalPair { rs1: a, rs2: b } => {
            format!("{}, {}", render_local(a, rs1), render_local(b, rs2))
        }
        FieldLayout::TlbFlush => {
            if rs1 & 0x1 == 1 {
                "TLB Req skipped".to_string()
            } else {
                "not flush TLB".to_string()
            }
        }
        FieldLayout::LoopFlags => format!(
            "Activation: {}, Low D: {}, Full C: {}, Ex Accumulate: {}, B Transpose: {}, A Transpose: {}",
            activation_name(bits(rs1, 8, 8)),
            bits(rs1, 2, 1),
            bits(rs1, 1, 1),
            bits(rs1, 0, 1),
            bits(rs2, 1, 1),
            bits(rs2, 0, 1),
        ),
        FieldLayout::Packed16 {
            rs1: (rs1_heading, rs1_names),
            rs2: (rs2_heading, rs2_names),
        } => format!(
            "{rs1_heading}: {}, {rs2_heading}: {}",
            split_word(rs1_names, rs1).join(", "),
            split_word(rs2_names, rs2).join(", "),
        ),
        FieldLayout::AddressPair { rs1: a, rs2: b } => format!("{a}: {rs1:#x}, {b}: {rs2:#x}"),
        FieldLayout::CountPair { rs1: a, rs2: b } => format!("{a}: {rs1}, {b}: {rs2}"),
        FieldLayout::ConvConfig(index) => render_conv_config(index, rs1, rs2),
        FieldLayout::RawWords => format!("rs1: {rs1:#x}, rs2: {rs2:#x}"),
    }
}

fn render_local(name: &str, word: u64) -> String {
    format!(
        "{name} Scratchpad addr: {:#x}, {} cols, {} rows",
        bits(word, 0, 32),
        bits(word, 32, 16),
        bits(word, 48, 16),
    )
}

fn render_config(rs1: u64, rs2: u64) -> String {
    match bits(rs1, 0, 2) {
        0 => format!(
            "CONFIG_EX Output stationary: {}, Activation: {}, stride: {:#x}, scalar: {:#x}, right shift: {:#x}",
            STATIONARY_TYPES[usize::from(rs1 & 0x4 != 0)],
            activation_name(bits(rs1, 3, 3)),
            bits(rs1, 16, 16),
            bits(rs1, 32, 16),
            bits(rs2, 0, 8),
        ),
        1 => format!(
            "CONFIG_LD Spad stride: {:#x}, scale: {:#x}, mem stride: {:#x}",
            bits(rs1, 16, 16),
            bits(rs1, 32, 16),
            bits(rs2, 0, 16),
        ),
        2 => format!("CONFIG_ST stride: {:#x}", bits(rs2, 0, 16)),
        _ => "CONFIG_BERT".to_string(),
    }
}

/// Splits `word` into `names.len()` equal-width fields, lowest bits first.
///
/// One name takes the whole word, two take 32 bits each, anything else takes
/// 16 bits per name.
fn split_word(names: &[&str], mut word: u64) -> Vec<String> {
    let width = match names.len() {
        1 => 64,
        2 => 32,
        _ => 16,
    };

    names
        .iter()
        .map(|name| {
            let field = if width == 64 { word } else { bits(word, 0, width) };
            if width < 64 {
                word >>= width;
            }
            format!("{name}: {field:#x}")
        })
        .collect()
}

fn render_conv_config(index: u8, rs1: u64, rs2: u64) -> String {
    let slot = usize::from(index).min(CONV_RS1_LAYOUTS.len() - 1);
    let mut fields = split_word(CONV_RS1_LAYOUTS[slot], rs1);
    fields.extend(split_word(CONV_RS2_LAYOUTS[slot], rs2));
    fields.join(", ")
}
