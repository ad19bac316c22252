//! Ready-made solution generators.

use std::sync::Arc;

use otpkit_common::ConfigError;
use rand::Rng;

/// Produces the secret solution for a new challenge
pub type SolutionGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Uniform zero-padded decimal codes with `digits` digits (4 to 18)
pub fn numeric_solution_generator(digits: u32) -> Result<SolutionGenerator, ConfigError> {
    if !(4..=18).contains(&digits) {
        return Err(ConfigError::InvalidSolutionDigits(digits));
    }

    let upper = 10u64.pow(digits);
    let width = digits as usize;

    Ok(Arc::new(move || {
        let code = rand::rng().random_range(0..upper);
        format!("{:0width$}", code, width = width)
    }))
}

/// Always returns `solution`. Useful in tests and demos.
pub fn fixed_solution_generator(solution: impl Into<String>) -> SolutionGenerator {
    let solution = solution.into();
    Arc::new(move || solution.clone())
}
