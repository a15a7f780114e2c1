mod error_kind;

use error_kind::ErrorKindTarget;
use proc_macro::TokenStream;
use quote::quote;
use syn::parse_macro_input;

/// Derives the [`ErrorKind`] trait for the given struct.
///
/// This trait can be derived for any struct with named fields, or for unit structs.
///
/// The information of the error can be customized using the `error` attribute by adding the
/// corresponding tags to it:
/// ```
/// use form_attrs::ErrorKind;
///
/// #[derive(Debug, ErrorKind)]
/// #[error(
///     message = format!("unknown coefficient `{}`", self.name),
///     labels = ["this coefficient"],
///     help = "add the coefficient to the form data",
/// )]
/// pub struct UnknownCoefficient {
///     pub name: String,
/// }
/// ```
///
/// The following tags are available:
///
/// | Tag       | Description                                                                     |
/// | --------- | ------------------------------------------------------------------------------- |
/// | `message` | The message displayed at the top of the error when it is displayed.             |
/// | `labels`  | An array of label texts, one for each span of the error, in order.             |
/// | `help`    | Optional help text for the error, describing what the user can do to fix it.    |
/// | `note`    | Optional note with extra context about the error.                               |
///
/// Each tag accepts an expression that should evaluate to a [`String`] (or an array of them, for
/// `labels`). For structs with named fields, the expression is evaluated with the members of the
/// struct in scope, so they can be used in the expression (tuple structs are not supported).
///
/// The generated implementation refers to `ariadne` and `form_error`, so both must be
/// dependencies of the crate deriving the trait.
///
/// [`ErrorKind`]: https://docs.rs/form-error/latest/form_error/trait.ErrorKind.html
#[proc_macro_derive(ErrorKind, attributes(error))]
pub fn error_kind(item: TokenStream) -> TokenStream {
    let target = parse_macro_input!(item as ErrorKindTarget);
    let name = &target.name;
    quote! {
        impl form_error::ErrorKind for #name {
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
            #target
        }
    }.into()
}
