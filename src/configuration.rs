//! one point of the parameter sweep and the values derived from it

use serde::{Deserialize, Serialize};

/// the widest output activation the derived formula may produce
pub const MAX_OUT_WL: u32 = 16;

/// the arithmetic regime selected by the input and weight word lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithMode {
    Xnor,
    BinWgt,
    Std,
}

impl ArithMode {
    /// 1-bit inputs and weights run as XNOR, 1-bit weights alone as binary weights
    pub fn select(inp_wl: u32, wgt_wl: u32) -> Self {
        if inp_wl == 1 && wgt_wl == 1 {
            ArithMode::Xnor
        } else if wgt_wl == 1 {
            ArithMode::BinWgt
        } else {
            ArithMode::Std
        }
    }

    /// the tag used in report keys
    pub fn tag(&self) -> &'static str {
        match self {
            ArithMode::Xnor => "XNOR",
            ArithMode::BinWgt => "BIN WGT",
            ArithMode::Std => "STD",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ArithMode::Xnor => "XNOR",
            ArithMode::BinWgt => "Binary Weights",
            ArithMode::Std => "Standard",
        }
    }
}

/// 2-bit operator sign code: bit 0 is the input sign, bit 1 the weight sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OpSign(u8);

impl OpSign {
    pub fn new(inp_signed: bool, wgt_signed: bool) -> Self {
        OpSign(u8::from(inp_signed) | (u8::from(wgt_signed) << 1))
    }
    pub fn code(&self) -> u8 {
        self.0
    }
}

/// how the output activation width of a point is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutWidth {
    /// `min(16, inp_wl + wgt_wl + ceil(log2(kdim^2 * ifm_ch)))`
    Derived,
    Fixed { width: u32 },
}

impl Default for OutWidth {
    fn default() -> Self {
        OutWidth::Derived
    }
}

impl OutWidth {
    pub fn resolve(&self, kdim: u32, ifm_ch: u32, inp_wl: u32, wgt_wl: u32) -> u32 {
        match self {
            OutWidth::Fixed { width } => *width,
            OutWidth::Derived => {
                let acc_terms = (kdim as u64) * (kdim as u64) * (ifm_ch as u64);
                let width = inp_wl
                    .saturating_add(wgt_wl)
                    .saturating_add(ceil_log2(acc_terms));
                MAX_OUT_WL.min(width)
            }
        }
    }
}

fn ceil_log2(n: u64) -> u32 {
    if n <= 1 {
        0
    } else {
        u64::BITS - (n - 1).leading_zeros()
    }
}

/// a visited point of the sweep, immutable once recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Configuration {
    pub index: usize,
    pub ifm_ch: u32,
    pub ifm_dim: u32,
    pub ofm_ch: u32,
    pub kdim: u32,
    pub inp_wl: u32,
    pub inp_signed: bool,
    pub wgt_wl: u32,
    pub wgt_signed: bool,
    pub out_wl: u32,
    pub simd: u32,
    pub pe: u32,
}

impl Configuration {
    pub fn mode(&self) -> ArithMode {
        ArithMode::select(self.inp_wl, self.wgt_wl)
    }

    pub fn op_sign(&self) -> OpSign {
        OpSign::new(self.inp_signed, self.wgt_signed)
    }

    /// column names of the configuration sheet
    pub fn column_names(signs: bool) -> Vec<String> {
        let names: &[&str] = if signs {
            &[
                "IFM_Ch", "IFM_Dim", "OFM_Ch", "KDim", "Inp_Act", "Inp_Sgn", "Wgt_Prec", "Wgt_Sgn",
                "Out_Act", "SIMD", "PE",
            ]
        } else {
            &[
                "IFM_Ch", "IFM_Dim", "OFM_Ch", "KDim", "Inp_Act", "Wgt_Prec", "Out_Act", "SIMD",
                "PE",
            ]
        };
        names.iter().map(|s| s.to_string()).collect()
    }

    /// the row written to the configuration sheet, in `column_names` order
    pub fn sheet_values(&self, signs: bool) -> Vec<u64> {
        let mut values = vec![
            self.ifm_ch as u64,
            self.ifm_dim as u64,
            self.ofm_ch as u64,
            self.kdim as u64,
            self.inp_wl as u64,
        ];
        if signs {
            values.push(self.inp_signed as u64);
        }
        values.push(self.wgt_wl as u64);
        if signs {
            values.push(self.wgt_signed as u64);
        }
        values.extend([self.out_wl as u64, self.simd as u64, self.pe as u64]);
        values
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn derived_out_width() {
        // ceil(log2(4*4*4)) = 6
        assert_eq!(OutWidth::Derived.resolve(4, 4, 4, 4), 14);
        assert_eq!(OutWidth::Derived.resolve(3, 64, 8, 8), 16);
        assert_eq!(OutWidth::Derived.resolve(1, 1, 1, 1), 2);
        assert_eq!(OutWidth::Derived.resolve(3, 2, 2, 2), 9);
        assert_eq!(OutWidth::Fixed { width: 11 }.resolve(4, 4, 4, 4), 11);
    }

    #[test]
    fn huge_word_lengths_clamp() {
        assert_eq!(OutWidth::Derived.resolve(3, 64, u32::MAX, u32::MAX), MAX_OUT_WL);
        assert_eq!(OutWidth::Derived.resolve(1, 1, u32::MAX - 1, 2), MAX_OUT_WL);
    }

    #[test]
    fn ceil_log2_edges() {
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(3), 2);
        assert_eq!(ceil_log2(64), 6);
        assert_eq!(ceil_log2(65), 7);
    }

    #[test]
    fn mode_selection() {
        assert_eq!(ArithMode::select(1, 1), ArithMode::Xnor);
        assert_eq!(ArithMode::select(3, 1), ArithMode::BinWgt);
        assert_eq!(ArithMode::select(3, 3), ArithMode::Std);
        assert_eq!(ArithMode::select(1, 3), ArithMode::Std);
    }

    #[test]
    fn op_sign_codes() {
        assert_eq!(OpSign::new(false, false).code(), 0);
        assert_eq!(OpSign::new(true, false).code(), 1);
        assert_eq!(OpSign::new(false, true).code(), 2);
        assert_eq!(OpSign::new(true, true).code(), 3);
    }

    #[test]
    fn sheet_row_matches_columns() {
        let config = Configuration {
            index: 0,
            ifm_ch: 600,
            ifm_dim: 1,
            ofm_ch: 64,
            kdim: 1,
            inp_wl: 2,
            inp_signed: false,
            wgt_wl: 2,
            wgt_signed: true,
            out_wl: 11,
            simd: 600,
            pe: 64,
        };
        for signs in [false, true] {
            assert_eq!(
                Configuration::column_names(signs).len(),
                config.sheet_values(signs).len()
            );
        }
        assert_eq!(
            config.sheet_values(true),
            vec![600, 1, 64, 1, 2, 0, 2, 1, 11, 600, 64]
        );
    }
}
