pub mod normalize;
pub mod runs;
pub mod serve;
