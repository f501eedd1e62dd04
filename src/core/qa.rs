//! Quality-assurance token selection
//!
//! A QA run bursts a subset of the tokens (all of them, an explicit list, a
//! random sample, or an explicit list then sampled) so configuration problems
//! surface before a real distribution.

use crate::domain::errors::BurstError;
use crate::domain::ids::Token;
use crate::domain::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Folder name QA artifacts are grouped under
pub const QA_FOLDER: &str = "quality-assurance";

/// Name given to QA runs
pub const QA_TEST_NAME: &str = "quality-assurance-test-mode";

/// QA parameters of a burst request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QaRequest {
    /// Burst every token in QA mode
    pub test_all: bool,
    /// Burst only these tokens
    pub test_tokens: Vec<Token>,
    /// Burst a random sample of this size
    pub random_count: usize,
}

impl QaRequest {
    /// Returns true when any QA parameter is set
    pub fn is_requested(&self) -> bool {
        self.test_all || !self.test_tokens.is_empty() || self.random_count > 0
    }

    /// Parses a comma separated token list, ignoring blank entries
    pub fn parse_token_list(list: &str) -> Vec<Token> {
        list.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Token::from)
            .collect()
    }

    /// The explicit list as stored in progress records
    pub fn token_list(&self) -> String {
        self.test_tokens
            .iter()
            .map(Token::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Outcome of a QA selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaSelection {
    /// Tokens to burst, in canonical order unless sampled
    pub tokens: Vec<Token>,
    /// Whether the run is in QA mode
    pub is_qa: bool,
}

/// Narrows `tokens` according to `request`
///
/// The explicit list keeps the original token order. A random sample is
/// drawn from whatever the explicit list left.
///
/// # Errors
///
/// Returns [`BurstError::InvalidArgument`] if a listed token is not part of
/// `tokens`; `source` names the document in the message.
pub fn select<R: Rng + ?Sized>(
    tokens: Vec<Token>,
    request: &QaRequest,
    source: &str,
    rng: &mut R,
) -> Result<QaSelection> {
    if !request.is_requested() {
        return Ok(QaSelection {
            tokens,
            is_qa: false,
        });
    }

    let mut selected = tokens;

    if !request.test_tokens.is_empty() {
        let available: HashSet<&Token> = selected.iter().collect();
        if let Some(missing) = request.test_tokens.iter().find(|t| !available.contains(t)) {
            return Err(BurstError::InvalidArgument(format!(
                "You provided the list: {}, which is not correct ('{}' is unknown). Please provide a comma separated \
                 list of burst tokens which should be tested. Each of the elements from this list should be a valid \
                 burst token from '{}'!",
                request.token_list(),
                missing,
                source
            )));
        }

        let wanted: HashSet<&Token> = request.test_tokens.iter().collect();
        selected.retain(|t| wanted.contains(t));
    }

    if request.random_count > 0 {
        selected.shuffle(rng);
        selected.truncate(request.random_count);
    }

    tracing::info!(
        selected = selected.len(),
        test_all = request.test_all,
        random_count = request.random_count,
        "Quality assurance mode"
    );

    Ok(QaSelection {
        tokens: selected,
        is_qa: true,
    })
}
