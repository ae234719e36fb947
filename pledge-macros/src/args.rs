use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Error, Expr, ExprLit, Lit, LitInt, LitStr, MetaNameValue, Token};

/// Options accepted by `#[pledge::main(...)]`.
#[derive(Default)]
pub(crate) struct MainArgs {
    pub(crate) name: Option<LitStr>,
    pub(crate) worker_name_prefix: Option<LitStr>,
    pub(crate) worker_stack_size: Option<LitInt>,
}

impl Parse for MainArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = MainArgs::default();
        let pairs = Punctuated::<MetaNameValue, Token![,]>::parse_terminated(input)?;

        for pair in pairs {
            let Some(key) = pair.path.get_ident() else {
                return Err(Error::new_spanned(&pair.path, "expected a plain option name"));
            };

            let Expr::Lit(ExprLit { lit, .. }) = &pair.value else {
                return Err(Error::new_spanned(&pair.value, "expected a literal"));
            };

            match (key.to_string().as_str(), lit) {
                ("name", Lit::Str(value)) => args.name = Some(value.clone()),
                ("worker_name_prefix", Lit::Str(value)) => {
                    args.worker_name_prefix = Some(value.clone())
                }
                ("worker_stack_size", Lit::Int(value)) => {
                    args.worker_stack_size = Some(value.clone())
                }
                ("name" | "worker_name_prefix", _) => {
                    return Err(Error::new_spanned(lit, "expected a string literal"));
                }
                ("worker_stack_size", _) => {
                    return Err(Error::new_spanned(lit, "expected an integer literal"));
                }
                _ => {
                    return Err(Error::new_spanned(
                        key,
                        "unknown option, expected `name`, \
                         `worker_name_prefix` or `worker_stack_size`",
                    ));
                }
            }
        }

        Ok(args)
    }
}
