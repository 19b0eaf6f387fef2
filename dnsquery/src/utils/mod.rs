cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        pub mod url;

        pub use url::{DohUrl, HostType, Scheme, UrlError};
    }
}
