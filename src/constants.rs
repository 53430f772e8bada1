pub mod matching {

    /// Minimum score for treating a typed name as an already-cataloged author.
    pub const CATALOG_MATCH_THRESHOLD: u8 = 95;

    /// Minimum score for accepting that a provider result denotes the typed name.
    pub const PROVIDER_MATCH_THRESHOLD: u8 = 90;

    pub const MIN_NAME_LEN: usize = 2;

    /// Generic author name that must never spawn a catalog entry on its own.
    pub const UNKNOWN_AUTHOR: &str = "Unknown";
}

pub mod placeholder {

    pub const AUTHOR_NAME: &str = "Loading";

    pub const AUTHOR_IMAGE: &str = "images/nophoto.png";

    /// Marker found in provider image URLs that carry no real photo.
    pub const NO_PHOTO_MARKER: &str = "nophoto";

    /// Prefix for author ids synthesized before the provider id is known.
    pub const UNRESOLVED_ID_PREFIX: &str = "0: ";
}

pub mod limits {

    pub const MAX_SEARCH_RESULTS: usize = 20;

    pub const MAX_AUTHOR_BOOKS: usize = 500;
}
