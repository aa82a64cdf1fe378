use serde::{Deserialize, Serialize};

/// Page Segmentation Mode for Tesseract OCR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PSMMode {
    OsdOnly = 0,
    AutoOsd = 1,
    AutoOnly = 2,
    Auto = 3,
    SingleColumn = 4,
    SingleBlockVertical = 5,
    SingleBlock = 6,
    SingleLine = 7,
    SingleWord = 8,
    CircleWord = 9,
    SingleChar = 10,
    SparseText = 11,
    SparseTextOsd = 12,
    RawLine = 13,
}

impl PSMMode {
    pub fn from_u8(value: u8) -> Result<Self, String> {
        match value {
            0 => Ok(PSMMode::OsdOnly),
            1 => Ok(PSMMode::AutoOsd),
            2 => Ok(PSMMode::AutoOnly),
            3 => Ok(PSMMode::Auto),
            4 => Ok(PSMMode::SingleColumn),
            5 => Ok(PSMMode::SingleBlockVertical),
            6 => Ok(PSMMode::SingleBlock),
            7 => Ok(PSMMode::SingleLine),
            8 => Ok(PSMMode::SingleWord),
            9 => Ok(PSMMode::CircleWord),
            10 => Ok(PSMMode::SingleChar),
            11 => Ok(PSMMode::SparseText),
            12 => Ok(PSMMode::SparseTextOsd),
            13 => Ok(PSMMode::RawLine),
            _ => Err(format!("Invalid PSM mode value: {}", value)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

/// Tesseract OCR Engine Mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OemMode {
    LegacyOnly = 0,
    LstmOnly = 1,
    LegacyAndLstm = 2,
    Default = 3,
}

impl OemMode {
    pub fn from_u8(value: u8) -> Result<Self, String> {
        match value {
            0 => Ok(OemMode::LegacyOnly),
            1 => Ok(OemMode::LstmOnly),
            2 => Ok(OemMode::LegacyAndLstm),
            3 => Ok(OemMode::Default),
            _ => Err(format!("Invalid OEM mode value: {}", value)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

/// Options handed to [`OcrEngine::recognize`](super::OcrEngine::recognize) for every page of a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecognizeOptions {
    pub language: String,
    pub oem: OemMode,
    pub psm: PSMMode,
}

impl Default for RecognizeOptions {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            oem: OemMode::LstmOnly,
            psm: PSMMode::Auto,
        }
    }
}
