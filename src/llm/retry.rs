use crate::diff::{reduce, FileStatus, ReducedDiff};
use crate::tokens;

use super::prompt_builder::{self, PromptContext, PromptPair};
use super::{LlmClient, LlmError};

/// Attempts per generation request. Attempt `i` works with half the diff
/// budget of attempt `i - 1`.
pub const MAX_RETRIES: u32 = 3;

/// Tokens held back for the model's own response.
pub const RESPONSE_RESERVE: usize = 500;

/// The diff budget never shrinks below this, however small the window.
pub const MIN_DIFF_BUDGET: usize = 500;

/// Everything one generation request needs: the raw inputs the reducer works
/// from, the prompt context, and the backend's total window.
pub struct GenerationRequest<'a> {
    pub raw_diff: &'a str,
    pub statuses: &'a [FileStatus],
    pub ignore_patterns: &'a [String],
    pub prompt: PromptContext<'a>,
    /// Backend context ceiling, or the user's fixed override.
    pub provider_budget: usize,
}

/// Token budget for the diff portion of attempt `attempt`: what is left of
/// the window after prompt overhead and the response reserve, halved per
/// attempt, floored at [`MIN_DIFF_BUDGET`].
pub fn diff_budget(provider_budget: usize, overhead: usize, attempt: u32) -> usize {
    let available = provider_budget
        .saturating_sub(overhead)
        .saturating_sub(RESPONSE_RESERVE);
    (available >> attempt).max(MIN_DIFF_BUDGET)
}

/// One generation request moves `Attempting(i)` → `Succeeded`,
/// `Retrying(i + 1)`, or `Failed`. `Retrying` re-enters `Attempting` only
/// while attempts remain; the carried error becomes terminal otherwise.
enum RetryState {
    Attempting(u32),
    Retrying { next: u32, err: LlmError },
    Succeeded(String),
    Failed(LlmError),
}

/// Run reduce → assemble → generate with a shrinking budget until the backend
/// accepts the request.
///
/// Only size-class failures re-enter the loop; every other error, and a
/// size-class error on the final attempt, propagates unchanged. A response
/// with no usable text is reported as [`LlmError::Empty`] rather than
/// retried. Attempts run strictly one after another: each exists to shrink
/// the payload the previous one got rejected for.
pub fn generate_with_retry(
    client: &dyn LlmClient,
    req: &GenerationRequest,
) -> Result<String, LlmError> {
    // Non-diff prompt cost, measured once against an empty-diff placeholder.
    let placeholder = prompt_builder::build_prompt(&ReducedDiff::empty(), &req.prompt);
    let overhead = tokens::estimate(&placeholder.system) + tokens::estimate(&placeholder.user);

    let mut state = RetryState::Attempting(0);
    loop {
        state = match state {
            RetryState::Attempting(attempt) => {
                let budget = diff_budget(req.provider_budget, overhead, attempt);
                log::info!(
                    "generation attempt {}/{MAX_RETRIES}, diff budget {budget} tokens",
                    attempt + 1
                );

                let reduced = reduce(req.raw_diff, req.statuses, req.ignore_patterns, budget);
                if reduced.was_truncated {
                    log::debug!("diff truncated to fit: {}", reduced.summary_line);
                }
                let PromptPair { system, user } = prompt_builder::build_prompt(&reduced, &req.prompt);

                match client.generate(&system, &user) {
                    Ok(text) if text.trim().is_empty() => RetryState::Failed(LlmError::Empty),
                    Ok(text) => RetryState::Succeeded(text),
                    Err(err) if err.is_context_overflow() => RetryState::Retrying {
                        next: attempt + 1,
                        err,
                    },
                    Err(err) => RetryState::Failed(err),
                }
            }
            RetryState::Retrying { next, err } => {
                if next < MAX_RETRIES {
                    log::warn!("backend rejected the request as oversize, halving diff budget");
                    RetryState::Attempting(next)
                } else {
                    RetryState::Failed(err)
                }
            }
            RetryState::Succeeded(text) => return Ok(text),
            RetryState::Failed(err) => return Err(err),
        };
    }
}
