pub mod inventory;
pub mod ocr;
