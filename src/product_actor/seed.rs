use crate::domain::{Price, Product};

const SAMPLE_PRODUCTS: [(&str, &str, f64, bool); 6] = [
    ("beauty blender", "/images/beauty blender.jpg", 17.09, true),
    ("eye lashes", "/images/eye lashes.jpg", 5.99, false),
    ("make-up brushes", "/images/make-up brushes.jpg", 12.11, true),
    ("Mascara", "/images/Mascara.jpg", 10.37, true),
    ("Matte-lipstick", "/images/Matte-lipstick.jpg", 25.99, true),
    ("setting powder", "/images/setting powder.jpg", 30.00, true),
];

/// The sample catalog served by the local store, ids `1` through `6`.
pub fn sample_products() -> Vec<Product> {
    SAMPLE_PRODUCTS
        .iter()
        .enumerate()
        .map(|(index, &(name, image, price, in_stock))| Product {
            id: (index + 1).to_string().into(),
            name: name.to_string(),
            image: image.to_string(),
            price: Price::new_unchecked(price),
            in_stock,
        })
        .collect()
}
