pub mod normal;

pub use normal::{erf, norm_cdf, normal_pdf, percentile, z_score, Direction};
