pub mod beta;
pub mod pipeline;

pub use beta::{
    compute_betas,
    BetaComputer,
    BETA_OFFSET,
};
pub use pipeline::{
    decode_and_compute,
    decode_and_compute_batch,
    PipelineConfig,
};
