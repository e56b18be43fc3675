use darling::{
    FromDeriveInput, FromField,
    ast::{Data, Fields},
    util::Ignored,
};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Attribute, Expr, ExprLit, Generics, Ident, Lit, LitStr, Meta, Result, Type, TypePath,
    ext::IdentExt,
};

/// The name of the field annotation attribute.
const METRIC_ATTR_NAME: &str = "metric";

#[derive(FromDeriveInput)]
#[darling(supports(struct_named))]
pub(super) struct RecordInput {
    ident: Ident,
    generics: Generics,
    data: Data<Ignored, RecordField>,
}

#[derive(FromField)]
#[darling(forward_attrs(metric))]
struct RecordField {
    /// The identifier of the field.
    ident: Option<Ident>,
    /// The declared type of the field.
    ty: Type,
    /// The `#[metric]` attributes of the field.
    attrs: Vec<Attribute>,
}

/// The slot kind of a field, identified from its declared type.
///
/// Only the slot types of the runtime crate count: a bare `Counter`/`Histogram`, or a path into
/// `promtag` (optionally through the `counter`/`histogram` modules). Collector types of other
/// crates, such as `prometheus::Counter`, are ordinary fields.
///
/// ```ignore
/// assert!(matches!(SlotKind::of(&parse_quote!(promtag::Counter)), SlotKind::Counter));
/// assert!(matches!(SlotKind::of(&parse_quote!(Histogram)), SlotKind::Histogram));
/// assert!(matches!(SlotKind::of(&parse_quote!(prometheus::Counter)), SlotKind::Other));
/// assert!(matches!(SlotKind::of(&parse_quote!(Vec<Counter>)), SlotKind::Other));
/// ```
enum SlotKind {
    Counter,
    Histogram,
    Other,
}

impl SlotKind {
    fn of(ty: &Type) -> Self {
        let Type::Path(TypePath { qself: None, path }) = ty else {
            return Self::Other;
        };

        if path.segments.iter().any(|segment| !segment.arguments.is_none()) {
            return Self::Other;
        }

        let segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        match segments.as_slice() {
            ["Counter"] | ["promtag", "Counter"] | ["promtag", "counter", "Counter"] => Self::Counter,
            ["Histogram"] | ["promtag", "Histogram"] | ["promtag", "histogram", "Histogram"] => {
                Self::Histogram
            }
            _ => Self::Other,
        }
    }
}

impl RecordField {
    /// The raw annotation text of the field, if any.
    fn annotation(&self) -> Result<Option<LitStr>> {
        let mut attrs = self.attrs.iter().filter(|attr| attr.path().is_ident(METRIC_ATTR_NAME));

        let Some(attr) = attrs.next() else {
            return Ok(None);
        };

        if let Some(duplicate) = attrs.next() {
            return Err(syn::Error::new_spanned(
                duplicate,
                "Duplicate `metric` attribute, merge the annotations into one",
            ));
        }

        match &attr.meta {
            Meta::Path(_) => Ok(None),
            Meta::List(_) => attr.parse_args::<LitStr>().map(Some),
            Meta::NameValue(value) => match &value.value {
                Expr::Lit(ExprLit { lit: Lit::Str(lit), .. }) => Ok(Some(lit.clone())),
                other => Err(syn::Error::new_spanned(other, "Expected a string literal")),
            },
        }
    }

    /// Build the `FieldDescriptor` expression for this field.
    fn build_descriptor(&self) -> Result<TokenStream> {
        let Some(ident) = &self.ident else {
            return Err(syn::Error::new_spanned(&self.ty, "Expected a named field"));
        };

        let name = ident.unraw().to_string();
        let ty = &self.ty;
        let type_name = quote!(#ty).to_string();

        let annotation = match self.annotation()? {
            Some(text) => quote! { ::core::option::Option::Some(#text) },
            None => quote! { ::core::option::Option::None },
        };

        let slot = match SlotKind::of(ty) {
            SlotKind::Counter => quote! { ::promtag::FieldSlot::Counter(&mut self.#ident) },
            SlotKind::Histogram => quote! { ::promtag::FieldSlot::Histogram(&mut self.#ident) },
            SlotKind::Other => quote! { ::promtag::FieldSlot::Other },
        };

        Ok(quote! {
            ::promtag::FieldDescriptor::new(#name, #type_name, #annotation, #slot)
        })
    }
}

pub(super) fn expand(input: RecordInput) -> Result<TokenStream> {
    let RecordInput { ident, generics, data } = input;

    let Some(Fields { fields, .. }) = data.take_struct() else {
        return Err(syn::Error::new_spanned(&ident, "MetricRecord can only be derived for structs"));
    };

    let descriptors = fields.iter().map(RecordField::build_descriptor).collect::<Result<Vec<_>>>()?;

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::promtag::MetricRecord for #ident #ty_generics #where_clause {
            fn fields(&mut self) -> ::std::vec::Vec<::promtag::FieldDescriptor<'_>> {
                ::std::vec![#(#descriptors),*]
            }
        }

        // Collectors injected into a moved record would be lost, so the record itself is a handle
        // that always fails to unpack.
        impl #impl_generics ::promtag::RecordHandle for #ident #ty_generics #where_clause {
            fn unpack(
                &mut self,
            ) -> ::promtag::Result<::std::vec::Vec<::promtag::FieldDescriptor<'_>>> {
                ::core::result::Result::Err(::promtag::Error::NotAStructPointer {
                    type_name: ::core::any::type_name::<Self>(),
                })
            }
        }
    })
}
