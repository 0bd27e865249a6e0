use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// Opaque product identifier.
///
/// The store may hand out ids as JSON strings or JSON numbers; both are
/// normalised to their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Local id used for an optimistic insert until the store assigns one.
    pub fn placeholder(seq: u64) -> Self {
        Self(format!("local-{}", seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        })
    }
}

/// A finite, non-negative price.
///
/// Travels as a plain JSON number and displays with two decimals.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price(f64);

impl Price {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::InvalidPrice(value.to_string()));
        }
        Ok(Self(value))
    }

    /// Caller guarantees `value` is finite and non-negative.
    pub(crate) const fn new_unchecked(value: f64) -> Self {
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Price> for f64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl TryFrom<f64> for Price {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Price::new(value)
    }
}

impl TryFrom<i32> for Price {
    type Error = ValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Price::new(f64::from(value))
    }
}

impl TryFrom<i64> for Price {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Price::new(value as f64)
    }
}

impl FromStr for Price {
    type Err = ValidationError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let value: f64 = text
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidPrice(text.to_string()))?;
        Price::new(value)
    }
}

impl TryFrom<&str> for Price {
    type Error = ValidationError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl TryFrom<String> for Price {
    type Error = ValidationError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

fn default_in_stock() -> bool {
    true
}

/// One catalog item as held locally and exchanged with the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub image: String,
    pub price: Price,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

impl Product {
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        image: impl Into<String>,
        price: Price,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: image.into(),
            price,
            in_stock: true,
        }
    }

    pub fn out_of_stock(mut self) -> Self {
        self.in_stock = false;
        self
    }
}

/// What the user typed into the "add product" form.
///
/// `price` is kept as raw text so a rejected draft can be handed back
/// untouched for correction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub image: String,
    pub price: String,
}

impl ProductDraft {
    pub fn new(name: impl Into<String>, image: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            price: price.into(),
        }
    }

    /// Checks that every field is filled in and coerces the price.
    pub fn validate(&self) -> Result<ProductCreate, ValidationError> {
        let name = required("name", &self.name)?;
        let image = required("image", &self.image)?;
        let price = required("price", &self.price)?.parse()?;

        Ok(ProductCreate {
            name,
            image,
            price,
            in_stock: true,
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value.to_string())
}

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreate {
    pub name: String,
    pub image: String,
    pub price: Price,
    pub in_stock: bool,
}

impl ProductCreate {
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            image: self.image,
            price: self.price,
            in_stock: self.in_stock,
        }
    }
}

/// Partial update; only the `Some` fields go over the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
}

impl ProductPatch {
    pub fn price(price: Price) -> Self {
        Self {
            price: Some(price),
            ..Self::default()
        }
    }

    pub fn in_stock(in_stock: bool) -> Self {
        Self {
            in_stock: Some(in_stock),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.image.is_none() && self.price.is_none() && self.in_stock.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyPatch);
        }
        if let Some(name) = &self.name {
            required("name", name)?;
        }
        if let Some(image) = &self.image {
            required("image", image)?;
        }
        Ok(())
    }

    /// Writes the patched fields into `product`.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(image) = &self.image {
            product.image = image.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(in_stock) = self.in_stock {
            product.in_stock = in_stock;
        }
    }

    /// Copies the fields this patch touches from the store's acknowledged
    /// record into `product`, leaving every other field alone.
    pub fn copy_patched_fields(&self, acknowledged: &Product, product: &mut Product) {
        if self.name.is_some() {
            product.name = acknowledged.name.clone();
        }
        if self.image.is_some() {
            product.image = acknowledged.image.clone();
        }
        if self.price.is_some() {
            product.price = acknowledged.price;
        }
        if self.in_stock.is_some() {
            product.in_stock = acknowledged.in_stock;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_with_missing_fields_is_rejected() {
        let cases = [
            (ProductDraft::new("", "u", "1"), "name"),
            (ProductDraft::new("Blush", "", "1"), "image"),
            (ProductDraft::new("Blush", "u", ""), "price"),
            (ProductDraft::new("   ", "u", "1"), "name"),
        ];
        for (draft, field) in cases {
            assert_eq!(draft.validate(), Err(ValidationError::MissingField(field)));
        }
    }

    #[test]
    fn draft_coerces_price_and_defaults_stock() {
        let create = ProductDraft::new("Blush", "u", "9.99").validate().unwrap();
        assert_eq!(create.name, "Blush");
        assert_eq!(create.price.value(), 9.99);
        assert!(create.in_stock);
    }

    #[test]
    fn draft_rejects_unparseable_or_negative_price() {
        assert!(matches!(
            ProductDraft::new("Blush", "u", "abc").validate(),
            Err(ValidationError::InvalidPrice(_))
        ));
        assert!(matches!(
            ProductDraft::new("Blush", "u", "-2").validate(),
            Err(ValidationError::InvalidPrice(_))
        ));
    }

    #[test]
    fn price_rejects_non_finite_values() {
        assert!(Price::new(f64::NAN).is_err());
        assert!(Price::new(f64::INFINITY).is_err());
        assert!("inf".parse::<Price>().is_err());
        assert_eq!(Price::new(0.0).map(Price::value), Ok(0.0));
    }

    #[test]
    fn price_accepts_whole_numbers() {
        assert_eq!(Price::try_from(30).map(Price::value), Ok(30.0));
        assert_eq!(Price::try_from(5_i64).map(Price::value), Ok(5.0));
        assert_eq!(Price::try_from(-1), Err(ValidationError::InvalidPrice("-1".to_string())));
    }

    #[test]
    fn price_displays_two_decimals() {
        assert_eq!(Price::new(30.0).unwrap().to_string(), "30.00");
        assert_eq!(Price::new(17.09).unwrap().to_string(), "17.09");
    }

    #[test]
    fn product_accepts_numeric_and_text_ids() {
        let numeric: Product =
            serde_json::from_str(r#"{"id":4,"name":"Mascara","image":"m.jpg","price":10.37}"#).unwrap();
        assert_eq!(numeric.id, ProductId::new("4"));
        assert!(numeric.in_stock);

        let text: Product = serde_json::from_str(
            r#"{"id":"a1","name":"Mascara","image":"m.jpg","price":10.37,"inStock":false}"#,
        )
        .unwrap();
        assert_eq!(text.id.as_str(), "a1");
        assert!(!text.in_stock);
    }

    #[test]
    fn product_with_negative_price_fails_to_decode() {
        let decoded = serde_json::from_str::<Product>(r#"{"id":1,"name":"x","image":"y","price":-1}"#);
        assert!(decoded.is_err());
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let body = serde_json::to_value(ProductPatch::in_stock(false)).unwrap();
        assert_eq!(body, serde_json::json!({ "inStock": false }));

        let body = serde_json::to_value(ProductPatch::price(Price::new(12.5).unwrap())).unwrap();
        assert_eq!(body, serde_json::json!({ "price": 12.5 }));
    }

    #[test]
    fn copy_patched_fields_leaves_untouched_fields_alone() {
        let mut local = Product::new("1", "Mascara", "m.jpg", Price::new(10.0).unwrap());
        let acknowledged = Product::new("1", "Renamed elsewhere", "other.jpg", Price::new(12.0).unwrap()).out_of_stock();

        ProductPatch::price(Price::new(12.0).unwrap()).copy_patched_fields(&acknowledged, &mut local);

        assert_eq!(local.price.value(), 12.0);
        assert_eq!(local.name, "Mascara");
        assert_eq!(local.image, "m.jpg");
        assert!(local.in_stock);
    }

    #[test]
    fn empty_patch_is_invalid() {
        assert_eq!(ProductPatch::default().validate(), Err(ValidationError::EmptyPatch));
        let blank_name = ProductPatch {
            name: Some(" ".to_string()),
            ..ProductPatch::default()
        };
        assert_eq!(blank_name.validate(), Err(ValidationError::MissingField("name")));
    }
}
