use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{parse_macro_input, spanned::Spanned, Attribute, Data, DeriveInput, Fields, Ident, Type};

#[proc_macro_derive(NestedSetModel, attributes(nested_set))]
pub fn derive_nested_set_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match impl_nested_set_model(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct Options {
    id_field: Option<String>,
    id_type: Option<Type>,
    lft_field: Option<String>,
    rgt_field: Option<String>,
    depth_field: Option<String>,
    tree_field: Option<String>,
    name_field: Option<String>,
    entity_name: Option<String>,
}

fn impl_nested_set_model(input: &DeriveInput) -> syn::Result<TokenStream> {
    let struct_ident = &input.ident;

    let data_struct = match &input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new(
                input.span(),
                "NestedSetModel can only be derived for structs",
            ))
        }
    };

    let mut options = Options::default();

    for attr in &input.attrs {
        if attr.path().is_ident("nested_set") {
            parse_nested_set_attr(attr, &mut options)?;
        }
    }

    let id_field_name = options.id_field.unwrap_or_else(|| "id".to_string());
    let lft_field_name = options.lft_field.unwrap_or_else(|| "lft".to_string());
    let rgt_field_name = options.rgt_field.unwrap_or_else(|| "rgt".to_string());
    let depth_field_name = options.depth_field.unwrap_or_else(|| "depth".to_string());
    let name_field_name = options.name_field.unwrap_or_else(|| "name".to_string());
    let tree_field_name = options.tree_field;

    let id_field_ident = Ident::new(&id_field_name, struct_ident.span());
    let lft_field_ident = Ident::new(&lft_field_name, struct_ident.span());
    let rgt_field_ident = Ident::new(&rgt_field_name, struct_ident.span());
    let depth_field_ident = Ident::new(&depth_field_name, struct_ident.span());
    let name_field_ident = Ident::new(&name_field_name, struct_ident.span());

    let mut id_field_type: Option<Type> = options.id_type.clone();

    if let Fields::Named(ref fields) = data_struct.fields {
        for field in &fields.named {
            if let Some(ident) = &field.ident {
                if ident == &id_field_ident && id_field_type.is_none() {
                    id_field_type = Some(field.ty.clone());
                }
            }
        }
    } else {
        return Err(syn::Error::new(
            data_struct.fields.span(),
            "NestedSetModel requires named fields",
        ));
    }

    let id_type = id_field_type.ok_or_else(|| {
        syn::Error::new(
            struct_ident.span(),
            "Unable to determine id field type; specify `id_type = ...` in #[nested_set]",
        )
    })?;

    let entity_name = options
        .entity_name
        .unwrap_or_else(|| struct_ident.unraw().to_string());

    let id_column_variant = format_ident!("{}", to_pascal_case(&id_field_name));
    let lft_column_variant = format_ident!("{}", to_pascal_case(&lft_field_name));
    let rgt_column_variant = format_ident!("{}", to_pascal_case(&rgt_field_name));
    let depth_column_variant = format_ident!("{}", to_pascal_case(&depth_field_name));
    let name_column_variant = format_ident!("{}", to_pascal_case(&name_field_name));

    let lft_column_literal = syn::LitStr::new(&lft_field_name, struct_ident.span());
    let rgt_column_literal = syn::LitStr::new(&rgt_field_name, struct_ident.span());
    let depth_column_literal = syn::LitStr::new(&depth_field_name, struct_ident.span());
    let name_column_literal = syn::LitStr::new(&name_field_name, struct_ident.span());
    let entity_name_literal = syn::LitStr::new(&entity_name, struct_ident.span());

    let (tree_option, tree_id_body, tree_column_body) = match tree_field_name {
        Some(tree_field_name) => {
            let tree_field_ident = Ident::new(&tree_field_name, struct_ident.span());
            let tree_column_variant = format_ident!("{}", to_pascal_case(&tree_field_name));
            let tree_column_literal = syn::LitStr::new(&tree_field_name, struct_ident.span());
            (
                quote! { .tree_column(#tree_column_literal) },
                quote! { ::core::option::Option::Some(self.#tree_field_ident.clone()) },
                quote! { ::core::option::Option::Some(Column::#tree_column_variant) },
            )
        }
        None => (
            quote! {},
            quote! { ::core::option::Option::None },
            quote! { ::core::option::Option::None },
        ),
    };

    let generated = quote! {
        impl ::nested_set::NestedSetModel for #struct_ident {
            type Entity = Entity;
            type ActiveModel = ActiveModel;
            type Id = #id_type;

            fn nested_set_config() -> &'static ::nested_set::NestedSetConfig {
                static CONFIG: ::once_cell::sync::Lazy<::nested_set::NestedSetConfig> =
                    ::once_cell::sync::Lazy::new(|| {
                        let base = ::nested_set::NestedSetConfig::new(#entity_name_literal);
                        ::nested_set::NestedSetOptions::default()
                            .lft_column(#lft_column_literal)
                            .rgt_column(#rgt_column_literal)
                            .depth_column(#depth_column_literal)
                            .name_column(#name_column_literal)
                            #tree_option
                            .apply(base)
                    });
                &CONFIG
            }

            fn id(&self) -> Self::Id {
                self.#id_field_ident.clone()
            }

            fn id_to_value(id: &Self::Id) -> ::sea_orm::Value {
                ::sea_orm::Value::from(id.clone())
            }

            fn lft(&self) -> i32 {
                self.#lft_field_ident
            }

            fn rgt(&self) -> i32 {
                self.#rgt_field_ident
            }

            fn depth(&self) -> i32 {
                self.#depth_field_ident
            }

            fn tree_id(&self) -> ::core::option::Option<Self::Id> {
                #tree_id_body
            }

            fn name(&self) -> &str {
                self.#name_field_ident.as_str()
            }

            fn id_column() -> <Self::Entity as ::sea_orm::EntityTrait>::Column {
                Column::#id_column_variant
            }

            fn lft_column() -> <Self::Entity as ::sea_orm::EntityTrait>::Column {
                Column::#lft_column_variant
            }

            fn rgt_column() -> <Self::Entity as ::sea_orm::EntityTrait>::Column {
                Column::#rgt_column_variant
            }

            fn depth_column() -> <Self::Entity as ::sea_orm::EntityTrait>::Column {
                Column::#depth_column_variant
            }

            fn name_column() -> <Self::Entity as ::sea_orm::EntityTrait>::Column {
                Column::#name_column_variant
            }

            fn tree_column() -> ::core::option::Option<<Self::Entity as ::sea_orm::EntityTrait>::Column> {
                #tree_column_body
            }
        }
    };

    Ok(generated.into())
}

fn parse_nested_set_attr(attr: &Attribute, options: &mut Options) -> syn::Result<()> {
    attr.parse_nested_meta(|meta| {
        let ident = meta
            .path
            .get_ident()
            .ok_or_else(|| syn::Error::new(meta.path.span(), "Invalid option key"))?
            .to_string();

        match ident.as_str() {
            "id_field" => {
                let value: syn::LitStr = meta.value()?.parse()?;
                options.id_field = Some(value.value());
            }
            "id_type" => {
                let ty: Type = meta.value()?.parse()?;
                options.id_type = Some(ty);
            }
            "lft_field" => {
                let value: syn::LitStr = meta.value()?.parse()?;
                options.lft_field = Some(value.value());
            }
            "rgt_field" => {
                let value: syn::LitStr = meta.value()?.parse()?;
                options.rgt_field = Some(value.value());
            }
            "depth_field" => {
                let value: syn::LitStr = meta.value()?.parse()?;
                options.depth_field = Some(value.value());
            }
            "tree_field" => {
                let value: syn::LitStr = meta.value()?.parse()?;
                options.tree_field = Some(value.value());
            }
            "name_field" => {
                let value: syn::LitStr = meta.value()?.parse()?;
                options.name_field = Some(value.value());
            }
            "entity_name" => {
                let value: syn::LitStr = meta.value()?.parse()?;
                options.entity_name = Some(value.value());
            }
            other => {
                return Err(syn::Error::new(
                    meta.path.span(),
                    format!("Unsupported nested_set option `{other}`"),
                ));
            }
        }

        Ok(())
    })
}

fn to_pascal_case(value: &str) -> String {
    value
        .split('_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
