// Application layer: wire messages, mapping and text export

pub mod lp_format;
pub mod mappers;
pub mod proto;

pub use lp_format::write_lp;
pub use mappers::decode_problem;
