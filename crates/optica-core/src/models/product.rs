use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Eyeglasses,
    Sunglasses,
    Contacts,
    Accessories,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductCategory::Eyeglasses => write!(f, "Eyeglasses"),
            ProductCategory::Sunglasses => write!(f, "Sunglasses"),
            ProductCategory::Contacts => write!(f, "Contact Lenses"),
            ProductCategory::Accessories => write!(f, "Accessories"),
            ProductCategory::Other => write!(f, "Other"),
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    // The backend uses Mongo-style "_id"; older snapshots wrote "id"
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<ProductCategory>,
    #[serde(default)]
    pub price: f64,
    #[serde(rename = "originalPrice", default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(rename = "frameShape", default, skip_serializing_if = "Option::is_none")]
    pub frame_shape: Option<String>,
    #[serde(rename = "inStock", default = "default_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    /// Fields the backend sends that this client does not model.
    #[cfg_attr(feature = "ts", ts(skip))]
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Percentage off the original price, if the product is discounted.
    pub fn discount_percent(&self) -> Option<u32> {
        let original = self.original_price?;
        if original <= 0.0 || self.price >= original {
            return None;
        }
        Some((((original - self.price) / original) * 100.0).round() as u32)
    }

    pub fn price_display(&self) -> String {
        format!("${:.2}", self.price)
    }

    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Payload for creating or updating a product. Omitted fields are left
/// unchanged by the backend on update.
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ProductCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(rename = "originalPrice", skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "frameShape", skip_serializing_if = "Option::is_none")]
    pub frame_shape: Option<String>,
    #[serde(rename = "inStock", skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    /// Image URLs to keep; uploaded files are appended by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

/// An image file attached to a product write.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Build an upload, guessing the content type from the file extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

/// Query parameters for the product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<ProductCategory>,
    pub brand: Option<String>,
    pub featured: Option<bool>,
    pub search: Option<String>,
}

impl ProductFilter {
    /// Render as a query string (including the leading `?`), or an empty
    /// string when no filter is set.
    pub fn to_query(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if let Some(category) = self.category {
            if let Ok(Value::String(s)) = serde_json::to_value(category) {
                pairs.push(("category", s));
            }
        }
        if let Some(ref brand) = self.brand {
            pairs.push(("brand", brand.clone()));
        }
        if let Some(featured) = self.featured {
            pairs.push(("featured", featured.to_string()));
        }
        if let Some(ref search) = self.search {
            pairs.push(("search", search.clone()));
        }

        if pairs.is_empty() {
            return String::new();
        }

        let joined: Vec<String> = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, encode_component(v)))
            .collect();
        format!("?{}", joined.join("&"))
    }
}

impl ProductFilter {
    /// Parse a query string as rendered by [`ProductFilter::to_query`].
    /// The leading `?` is optional and unknown keys are ignored.
    pub fn from_query(query: &str) -> Self {
        let mut filter = ProductFilter::default();
        for pair in query.trim_start_matches('?').split('&') {
            let Some((key, raw)) = pair.split_once('=') else {
                continue;
            };
            let value = decode_component(raw);
            match key {
                "category" => {
                    filter.category = serde_json::from_value(Value::String(value)).ok();
                }
                "brand" => filter.brand = Some(value),
                "featured" => filter.featured = value.parse().ok(),
                "search" => filter.search = Some(value),
                _ => {}
            }
        }
        filter
    }

    /// Whether `product` would be listed under this filter. Brand and search
    /// compare case-insensitively; search looks at name, brand and description.
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category {
            if product.category != Some(category) {
                return false;
            }
        }
        if let Some(ref brand) = self.brand {
            let same = product
                .brand
                .as_deref()
                .is_some_and(|b| b.eq_ignore_ascii_case(brand));
            if !same {
                return false;
            }
        }
        if let Some(featured) = self.featured {
            if product.featured != featured {
                return false;
            }
        }
        if let Some(ref search) = self.search {
            let needle = search.to_lowercase();
            let hit = [
                Some(product.name.as_str()),
                product.brand.as_deref(),
                product.description.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn decode_component(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                        continue;
                    }
                    None => out.push(b'%'),
                }
            }
            b'+' => out.push(b' '),
            other => out.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
