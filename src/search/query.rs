use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Restricts results to a recent time range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilter {
    Day,
    Week,
    Month,
    Year,
}

impl DateFilter {
    /// Value of the `df` form field
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Day => "d",
            Self::Week => "w",
            Self::Month => "m",
            Self::Year => "y",
        }
    }
}

impl FromStr for DateFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d" | "day" => Ok(Self::Day),
            "w" | "week" => Ok(Self::Week),
            "m" | "month" => Ok(Self::Month),
            "y" | "year" => Ok(Self::Year),
            other => Err(format!(
                "unknown date filter '{}' (expected day, week, month or year)",
                other
            )),
        }
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        };
        write!(f, "{}", name)
    }
}

/// A search query with its paging state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub date_filter: Option<DateFilter>,
    /// Result offset; 0 is the first page
    pub offset: u32,
    /// Session token from a previous page
    pub token: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            date_filter: None,
            offset: 0,
            token: None,
        }
    }

    pub fn with_date_filter(mut self, date_filter: Option<DateFilter>) -> Self {
        self.date_filter = date_filter;
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Returns true if this request needs a session token it does not have
    pub fn needs_token(&self) -> bool {
        self.offset > 0 && self.token.is_none()
    }

    /// Form fields POSTed to the search endpoint
    ///
    /// Paging fields (`s`, `dc`, `vqd`) are only sent for a non-zero offset
    /// with a token; without a token the upstream ignores the offset.
    pub fn form_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", self.query.clone())];

        if let Some(filter) = self.date_filter {
            params.push(("df", filter.as_param().to_string()));
        }

        if let (true, Some(token)) = (self.offset > 0, self.token.as_ref()) {
            params.push(("s", self.offset.to_string()));
            params.push(("dc", self.offset.saturating_add(1).to_string()));
            params.push(("vqd", token.clone()));
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_filter_aliases() {
        assert_eq!("d".parse::<DateFilter>().unwrap(), DateFilter::Day);
        assert_eq!("Day".parse::<DateFilter>().unwrap(), DateFilter::Day);
        assert_eq!("week".parse::<DateFilter>().unwrap(), DateFilter::Week);
        assert_eq!("M".parse::<DateFilter>().unwrap(), DateFilter::Month);
        assert_eq!("year".parse::<DateFilter>().unwrap(), DateFilter::Year);
        assert!("fortnight".parse::<DateFilter>().is_err());
    }

    #[test]
    fn test_date_filter_params() {
        assert_eq!(DateFilter::Day.as_param(), "d");
        assert_eq!(DateFilter::Week.as_param(), "w");
        assert_eq!(DateFilter::Month.as_param(), "m");
        assert_eq!(DateFilter::Year.as_param(), "y");
    }

    #[test]
    fn test_first_page_params() {
        let params = SearchRequest::new("rust lang").form_params();
        assert_eq!(params, vec![("q", "rust lang".to_string())]);
    }

    #[test]
    fn test_filtered_params() {
        let params = SearchRequest::new("rust")
            .with_date_filter(Some(DateFilter::Week))
            .form_params();
        assert_eq!(
            params,
            vec![("q", "rust".to_string()), ("df", "w".to_string())]
        );
    }

    #[test]
    fn test_paged_params() {
        let request = SearchRequest::new("rust")
            .with_offset(10)
            .with_token(Some("4-123".to_string()));
        assert!(!request.needs_token());
        assert_eq!(
            request.form_params(),
            vec![
                ("q", "rust".to_string()),
                ("s", "10".to_string()),
                ("dc", "11".to_string()),
                ("vqd", "4-123".to_string()),
            ]
        );
    }

    #[test]
    fn test_offset_without_token() {
        let request = SearchRequest::new("rust").with_offset(10);
        assert!(request.needs_token());
        assert_eq!(request.form_params(), vec![("q", "rust".to_string())]);
    }

    #[test]
    fn test_max_offset_does_not_overflow() {
        let request = SearchRequest::new("rust")
            .with_offset(u32::MAX)
            .with_token(Some("4-123".to_string()));
        let params = request.form_params();
        assert!(params.contains(&("s", u32::MAX.to_string())));
        assert!(params.contains(&("dc", u32::MAX.to_string())));
    }
}
