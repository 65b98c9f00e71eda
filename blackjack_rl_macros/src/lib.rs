use proc_macro::TokenStream as TokenStream1;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, ToTokens};
use syn::{self, parse::Parser, punctuated::Punctuated, Ident, Token};

/// This macro is added before a method of `Environment` in the impl block.
/// Use this macro to first check if the current episode phase is one of the
/// phases in the attribute.
///
/// For example, `#[allowed_phase(Active)]` will make a method first check if
/// the current phase is `Active`. If not, the method returns
/// `self.stale_step(..)` with a message naming the method and the phases, and
/// its body never runs. The guarded method must therefore return the same type
/// as `stale_step`.
#[proc_macro_attribute]
pub fn allowed_phase(attr: TokenStream1, item: TokenStream1) -> TokenStream1 {
    match expand_allowed_phase(attr.into(), item.into()) {
        Ok(ts) => ts.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_allowed_phase(attr: TokenStream2, item: TokenStream2) -> syn::Result<TokenStream2> {
    let mut ast: syn::ImplItemFn = syn::parse2(item)?;
    let phases = Punctuated::<Ident, Token![,]>::parse_terminated.parse2(attr)?;
    if phases.is_empty() {
        return Err(syn::Error::new_spanned(
            &ast.sig.ident,
            "allowed_phase needs at least one phase",
        ));
    }

    let phase_names: Vec<String> = phases.iter().map(|p| p.to_string()).collect();
    let msg = format!(
        "{} is only allowed in {} phase. Call reset()",
        ast.sig.ident,
        phase_names.join(" or ")
    );
    let phases = phases.iter();

    let early_return: syn::Stmt = syn::parse2(quote! {
        if !matches!(self.phase, #(EpisodePhase::#phases)|*) {
            return self.stale_step(#msg);
        }
    })?;
    ast.block.stmts.insert(0, early_return);
    Ok(ast.into_token_stream())
}
