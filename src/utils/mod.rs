//! Utility functions and helper macros used throughout the crate.
//!
//! - The shared rayon pool for batch decoding, sized by the
//!   `METHGEO_NUM_THREADS` environment variable.
//! - A macro for builder-style `with_*` methods.
//! - Polars helpers for building ordered frames out of plain columns.

use itertools::Itertools;
use log::warn;
use once_cell::sync::Lazy;
use polars::prelude::*;
use rayon::{
    ThreadPool,
    ThreadPoolBuilder,
};

pub const NUM_THREADS_ENV: &str = "METHGEO_NUM_THREADS";

pub static THREAD_POOL: Lazy<ThreadPool> = Lazy::new(|| {
    let num_threads: Option<usize> = std::env::var(NUM_THREADS_ENV)
        .ok()
        .and_then(|str| str.parse::<usize>().ok());
    ThreadPoolBuilder::new()
        .num_threads(num_threads.unwrap_or(0))
        .build()
        .expect("Failed to create thread pool")
});

pub fn n_threads() -> usize {
    THREAD_POOL.current_num_threads()
}

/// Builds a frame from named columns, warning about ragged input.
pub(crate) fn frame_from_columns(columns: Vec<Column>) -> PolarsResult<DataFrame> {
    let heights = columns.iter().map(Column::len).unique().collect_vec();
    if heights.len() > 1 {
        warn!("Building frame from columns of different heights: {:?}", heights);
    }
    DataFrame::new(columns)
}

#[macro_export]
macro_rules! with_field_fn {
    ($field_name: ident, $field_type: ty) => {
        paste::paste! {
            pub fn [<with_$field_name>](mut self, value: $field_type) -> Self {
                self.$field_name = value;
                self
            }
        }
    };
}
