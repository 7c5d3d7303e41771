// Contracts Module - Public ABIs Only

pub mod i_erc721_metadata;
pub mod i_nft_marketplace;

// Public exports
pub use i_erc721_metadata::IErc721Metadata;
pub use i_nft_marketplace::{
    AuctionCancelledFilter, AuctionCreatedFilter, AuctionFinalizedFilter, BidPlacedFilter,
    INftMarketplace, ListedFilter, ListingCancelledFilter, PurchasedFilter,
};
