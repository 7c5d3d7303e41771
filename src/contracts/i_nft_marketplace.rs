use ethers::prelude::*;

abigen!(
    INftMarketplace,
    r#"[
        event Listed(uint256 indexed tokenId, address indexed seller, uint256 price)
        event AuctionCreated(uint256 indexed tokenId, address indexed seller, uint256 reservePrice, uint256 endTime)
        event BidPlaced(uint256 indexed tokenId, address indexed bidder, uint256 amount)
        event AuctionFinalized(uint256 indexed tokenId, address winner, uint256 amount)
        event AuctionCancelled(uint256 indexed tokenId)
        event Purchased(uint256 indexed tokenId, address indexed buyer, uint256 price)
        event ListingCancelled(uint256 indexed tokenId)
        function getActiveListings() external view returns (uint256[] memory)
        function getActiveAuctions() external view returns (uint256[] memory)
        function getTokenInfo(uint256 tokenId) external view returns (address owner, bool isListed, bool isAuctioned, uint256 price, uint256 highestBid, uint256 auctionEndTime)
        function getCreatedTokens(address creator) external view returns (uint256[] memory)
        function getPurchasedTokens(address buyer) external view returns (uint256[] memory)
        function getWithdrawableBalance(address account) external view returns (uint256)
    ]"#
);
