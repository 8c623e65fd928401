pub mod aamva;
pub mod date_normalizer;
pub mod secure_qr;
pub mod tag_extractor;
pub mod text_correction;

pub use aamva::AamvaParser;
pub use date_normalizer::DateNormalizer;
pub use secure_qr::SecureQrDecoder;
pub use tag_extractor::TagExtractor;
