/// Generate client methods with oneshot channel boilerplate and automatic tracing.
macro_rules! client_method {
    ($(#[$meta:meta])* $client:ty => fn $method:ident($($param:ident: $param_type:ty),*) -> $return_type:ty as $request:ident::$variant:ident) => {
        impl $client {
            $(#[$meta])*
            #[tracing::instrument(skip(self))]
            pub async fn $method(&self, $($param: $param_type),*) -> Result<$return_type, $crate::error::CatalogError> {
                tracing::debug!("Sending request");
                self.request(|respond_to| $request::$variant {
                    $($param,)*
                    respond_to,
                })
                .await
            }
        }
    };
}
