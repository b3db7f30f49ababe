//! Variable specifications and the distribution sampler.
//!
//! ## Supported families
//!
//! | Family | Parameters | Uses shock |
//! |--------|------------|------------|
//! | normal | mean, std_dev | yes |
//! | lognormal | mean, std_dev (log space) | yes |
//! | uniform | min, max | no |
//! | triangular | min, mode, max | no |
//! | beta | alpha, beta, min, max | no |
//! | exponential | lambda | no |
//! | weibull | shape, scale | no |
//! | empirical | samples | no |
//! | custom | closure over the shock | yes |
//!
//! Parameter checks run at configuration time through
//! [`VariableSpec::validate`]; sampling itself only fails when beta
//! rejection sampling runs out of attempts.

mod error;
mod sampler;
mod spec;

pub use error::DistributionError;
pub use sampler::{Sampler, DEFAULT_MAX_REJECTION_ATTEMPTS};
pub use spec::{CustomTransform, Distribution, VariableSpec};
