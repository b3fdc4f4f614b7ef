mod token_amount;
mod wei;

pub use token_amount::TokenAmount;

pub use wei::ParseWeiError;
pub use wei::WeiNewtype;

/// stETH, like ETH, is denominated in wei with 18 decimals.
pub const TOKEN_DECIMALS: u32 = 18;
