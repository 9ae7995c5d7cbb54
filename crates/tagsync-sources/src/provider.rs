use reqwest::Url;
use std::fmt;

/// The list providers a rule URL can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Mdblist,
    Trakt,
}

impl Provider {
    /// Work out which provider serves `url`.
    ///
    /// MDBList is recognised by host; anything else is treated as a Trakt
    /// path or URL. Blank input yields `None`.
    pub fn identify(url: &str) -> Option<Provider> {
        let url = url.trim();
        if url.is_empty() {
            return None;
        }

        let is_mdblist = match Url::parse(url) {
            Ok(parsed) => parsed
                .host_str()
                .map(|host| host == "mdblist.com" || host.ends_with(".mdblist.com"))
                .unwrap_or(false),
            // Scheme-less input such as "mdblist.com/lists/..."
            Err(_) => url.to_lowercase().contains("mdblist.com"),
        };

        Some(if is_mdblist { Provider::Mdblist } else { Provider::Trakt })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Mdblist => "mdblist",
            Provider::Trakt => "trakt",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify() {
        assert_eq!(Provider::identify("https://mdblist.com/lists/someone/top"), Some(Provider::Mdblist));
        assert_eq!(Provider::identify("mdblist.com/lists/someone/top"), Some(Provider::Mdblist));
        assert_eq!(Provider::identify("https://trakt.tv/users/someone/lists/oscars"), Some(Provider::Trakt));
        assert_eq!(Provider::identify("/movies/trending"), Some(Provider::Trakt));
        assert_eq!(Provider::identify("https://example.com/?next=mdblist.com"), Some(Provider::Trakt));
        assert_eq!(Provider::identify("   "), None);
    }
}
