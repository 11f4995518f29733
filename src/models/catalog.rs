use serde::{Deserialize, Serialize};

/// A movie as returned by the catalog provider. Never persisted.
///
/// Field names follow the provider's payload so search results can be
/// handed to clients as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u64>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u64>,
}

/// Paged list envelope used by the search, discover and popular endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<CatalogItem>,
    #[serde(default)]
    pub total_results: u64,
}

/// Movie details payload; genres are objects here rather than bare IDs
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogItemDetails {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genres: Vec<CatalogGenre>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogGenre {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

impl From<CatalogItemDetails> for CatalogItem {
    fn from(details: CatalogItemDetails) -> Self {
        CatalogItem {
            id: details.id,
            title: details.title,
            poster_path: details.poster_path,
            genre_ids: details.genres.into_iter().map(|g| g.id).collect(),
            popularity: details.popularity,
            overview: details.overview,
            release_date: details.release_date,
            vote_average: details.vote_average,
            vote_count: details.vote_count,
        }
    }
}

/// Query filters for the discovery endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverFilters {
    /// `None` means unfiltered popularity discovery
    pub genre_id: Option<u64>,
    pub sort_by: &'static str,
    pub include_adult: bool,
    pub include_video: bool,
    pub page: u32,
    pub min_vote_count: u32,
    pub min_vote_average: f32,
}

impl DiscoverFilters {
    /// Popularity-sorted discovery restricted to well-rated titles
    pub fn popular_in(genre_id: Option<u64>) -> Self {
        Self {
            genre_id,
            sort_by: "popularity.desc",
            include_adult: false,
            include_video: false,
            page: 1,
            min_vote_count: 1000,
            min_vote_average: 6.0,
        }
    }

    /// Query-string pairs in the provider's filter syntax
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("sort_by", self.sort_by.to_string()),
            ("include_adult", self.include_adult.to_string()),
            ("include_video", self.include_video.to_string()),
            ("page", self.page.to_string()),
            ("vote_count.gte", self.min_vote_count.to_string()),
            ("vote_average.gte", self.min_vote_average.to_string()),
        ];
        if let Some(genre_id) = self.genre_id {
            query.push(("with_genres", genre_id.to_string()));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_query_with_genre() {
        let query = DiscoverFilters::popular_in(Some(28)).to_query();
        assert!(query.contains(&("sort_by", "popularity.desc".to_string())));
        assert!(query.contains(&("include_adult", "false".to_string())));
        assert!(query.contains(&("include_video", "false".to_string())));
        assert!(query.contains(&("page", "1".to_string())));
        assert!(query.contains(&("vote_count.gte", "1000".to_string())));
        assert!(query.contains(&("vote_average.gte", "6".to_string())));
        assert!(query.contains(&("with_genres", "28".to_string())));
    }

    #[test]
    fn test_discover_query_without_genre() {
        let query = DiscoverFilters::popular_in(None).to_query();
        assert!(query.iter().all(|(k, _)| *k != "with_genres"));
    }

    #[test]
    fn test_page_deserialization() {
        let json = r#"{
            "page": 1,
            "results": [
                {
                    "id": 603,
                    "title": "The Matrix",
                    "poster_path": "/f89U3ADr1oiB1s9GkdPOEpXUk5H.jpg",
                    "genre_ids": [28, 878],
                    "popularity": 83.2,
                    "vote_average": 8.2,
                    "vote_count": 25000,
                    "adult": false
                }
            ],
            "total_pages": 1,
            "total_results": 1
        }"#;

        let page: CatalogPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].id, 603);
        assert_eq!(page.results[0].genre_ids, vec![28, 878]);
        assert_eq!(page.results[0].vote_count, Some(25000));
    }

    #[test]
    fn test_details_into_item() {
        let json = r#"{
            "id": 27205,
            "title": "Inception",
            "poster_path": null,
            "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}],
            "popularity": 70.1
        }"#;

        let details: CatalogItemDetails = serde_json::from_str(json).unwrap();
        let item = CatalogItem::from(details);
        assert_eq!(item.title, "Inception");
        assert_eq!(item.genre_ids, vec![28, 878]);
        assert!(item.poster_path.is_none());
    }
}
