mod token;

pub use token::ExpiringLinkToken;
