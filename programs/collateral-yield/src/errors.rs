use anchor_lang::prelude::*;

#[error_code]
pub enum ErrorCode {
    #[msg("failed to perform some math operation safely")]
    MathError,

    #[msg("Failed to perform a math operation without an overflow")]
    OverflowError,

    #[msg("Asset is neither the underlying nor the wrapped asset of this vault")]
    UnsupportedCollateral,

    #[msg("Amount exceeds the caller's principal")]
    InsufficientPrincipal,

    #[msg("Realized output is below the minimum acceptable amount")]
    SlippageExceeded,

    #[msg("Caller is not a registered collateral vault")]
    UnregisteredCaller,

    #[msg("Swap path does not start at the reward asset or end at the settlement asset")]
    PathAssetMismatch,

    #[msg("Bucket index range is out of bounds")]
    IndexOutOfRange,

    #[msg("Number of swap paths does not match the bucket range")]
    LengthMismatch,

    #[msg("Swap path is malformed or has no known venue for a hop")]
    InvalidPath,

    #[msg("Vault is paused")]
    VaultPaused,

    #[msg("Signer is not allowed to call this instruction")]
    AuthorizationDenied,

    #[msg("No reserve has outstanding borrows")]
    NoBorrowVolume,

    #[msg("Pool reference cannot be null")]
    InvalidPoolReference,

    #[msg("Settlement asset must have non-zero decimals")]
    InvalidSettlementAsset,

    #[msg("Settlement asset has not been configured")]
    SettlementAssetNotSet,

    #[msg("Fees cannot be set to over 100% or without a treasury")]
    InvalidFeeConfig,

    #[msg("Slippage bound cannot be over 100%")]
    InvalidSlippageBound,

    #[msg("Yield route is not valid for this adapter")]
    InvalidVaultConfig,

    #[msg("Amount must be greater than zero")]
    InvalidAmount,

    #[msg("Harvest produced assets the configured route cannot handle")]
    UnexpectedHarvestProceeds,

    #[msg("Total principal changed during a harvest")]
    PrincipalInvariantViolated,

    #[msg("Invalid vault flags")]
    InvalidVaultFlags,
}
