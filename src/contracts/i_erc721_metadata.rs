use ethers::prelude::*;

abigen!(
    IErc721Metadata,
    r#"[
        function tokenURI(uint256 tokenId) external view returns (string memory)
        function ownerOf(uint256 tokenId) external view returns (address)
    ]"#
);
