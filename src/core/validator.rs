//! Pair validation
//!
//! Pure function of the current selection and the loaded reference data.
//! Matching is strict string equality on chain indices and symbols.

use std::collections::HashSet;

use crate::models::types::{Bridge, PairValidationResult, Token, TokenPair};
use crate::utils::constants::chain_name;

/// What the user currently has selected
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSelection {
    pub from_chain_index: Option<String>,
    pub to_chain_index: Option<String>,
    pub from_token: Option<Token>,
    pub to_token: Option<Token>,
}

impl RouteSelection {
    pub fn new(from_chain_index: impl Into<String>, to_chain_index: impl Into<String>) -> Self {
        Self {
            from_chain_index: Some(from_chain_index.into()),
            to_chain_index: Some(to_chain_index.into()),
            from_token: None,
            to_token: None,
        }
    }

    pub fn with_tokens(mut self, from_token: Token, to_token: Token) -> Self {
        self.from_token = Some(from_token);
        self.to_token = Some(to_token);
        self
    }
}

/// Validate the selected route against `pairs`, collecting the bridges that serve it
pub fn validate_pair(
    selection: &RouteSelection,
    bridges: &[Bridge],
    pairs: &[TokenPair],
) -> PairValidationResult {
    let (Some(from_chain), Some(to_chain), Some(from_token), Some(to_token)) = (
        selection.from_chain_index.as_deref(),
        selection.to_chain_index.as_deref(),
        selection.from_token.as_ref(),
        selection.to_token.as_ref(),
    ) else {
        return PairValidationResult::invalid("Please select both tokens.");
    };

    let exact = pairs.iter().any(|p| {
        p.on_route(from_chain, to_chain)
            && p.from_token_symbol == from_token.symbol
            && p.to_token_symbol == to_token.symbol
    });

    if exact {
        let available_bridges: Vec<Bridge> = bridges
            .iter()
            .filter(|b| b.connects(from_chain, to_chain))
            .cloned()
            .collect();
        let message = format!(
            "{} → {} is supported with {} bridge(s) available",
            from_token.symbol,
            to_token.symbol,
            available_bridges.len()
        );
        return PairValidationResult {
            is_valid: true,
            message,
            available_bridges,
        };
    }

    let mut route_pairs: Vec<String> = pairs
        .iter()
        .filter(|p| p.on_route(from_chain, to_chain))
        .map(|p| format!("{} → {}", p.from_token_symbol, p.to_token_symbol))
        .collect();
    let mut seen = HashSet::new();
    route_pairs.retain(|pair| seen.insert(pair.clone()));

    if route_pairs.is_empty() {
        return PairValidationResult::invalid(format!(
            "No supported pairs between {} and {}",
            chain_name(from_chain),
            chain_name(to_chain)
        ));
    }

    PairValidationResult::invalid(format!(
        "{} → {} is not supported between {} and {}. Available pairs: {}",
        from_token.symbol,
        to_token.symbol,
        chain_name(from_chain),
        chain_name(to_chain),
        route_pairs.join(", ")
    ))
}
