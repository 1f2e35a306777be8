pub mod common;

#[cfg(test)]
pub mod hash_puzzle_integration_tests;

#[cfg(test)]
pub mod contract_template_tests;
