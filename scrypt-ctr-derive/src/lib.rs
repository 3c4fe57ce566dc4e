use proc_macro::{Delimiter, Group, Ident, Literal, Punct, Spacing, Span, TokenStream, TokenTree};

fn compile_error(msg: &str, span: Span) -> TokenStream {
    let mut lit = Literal::string(msg);
    lit.set_span(span);
    let mut args = Group::new(Delimiter::Parenthesis, TokenTree::from(lit).into());
    args.set_span(span);

    [
        TokenTree::Ident(Ident::new("compile_error", span)),
        TokenTree::Punct(Punct::new('!', Spacing::Alone)),
        TokenTree::Group(args),
        TokenTree::Punct(Punct::new(';', Spacing::Alone)),
    ]
    .into_iter()
    .collect()
}

/// `"avx2"` or `"avx2,bmi2"`, possibly split across several comma-separated literals
fn parse_features(attrs: TokenStream) -> Result<Vec<String>, (String, Span)> {
    let mut features = Vec::new();

    for tt in attrs {
        match tt {
            TokenTree::Literal(lit) => {
                let s = lit.to_string();
                let Some(inner) = s.strip_prefix('"').and_then(|s| s.strip_suffix('"')) else {
                    return Err(("expected a string literal".into(), lit.span()));
                };
                for f in inner.split(',').map(str::trim).filter(|f| !f.is_empty()) {
                    if !f.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
                        return Err((format!("invalid target feature name: {}", f), lit.span()));
                    }
                    features.push(f.to_string());
                }
            }
            TokenTree::Punct(p) if p.as_char() == ',' => {}
            other => return Err(("expected a target feature string".into(), other.span())),
        }
    }

    if features.is_empty() {
        return Err(("no target feature given".into(), Span::call_site()));
    }

    Ok(features)
}

/// Emit `item` unchanged, followed by a copy named `<name>_<features>` compiled with the
/// given target features enabled.
///
/// Callers pick the variant at runtime after checking the CPU supports it.
#[proc_macro_attribute]
pub fn generate_target_variant(attrs: TokenStream, input: TokenStream) -> TokenStream {
    let features = match parse_features(attrs) {
        Ok(f) => f,
        Err((msg, span)) => return compile_error(&msg, span),
    };

    let tokens: Vec<TokenTree> = input.clone().into_iter().collect();

    let name_pos = tokens.windows(2).position(|w| {
        matches!((&w[0], &w[1]), (TokenTree::Ident(kw), TokenTree::Ident(_)) if kw.to_string() == "fn")
    });
    let Some(name_pos) = name_pos.map(|p| p + 1) else {
        return compile_error(
            "generate_target_variant expects a function definition",
            Span::call_site(),
        );
    };

    let TokenTree::Ident(name) = &tokens[name_pos] else {
        unreachable!()
    };
    let variant_name = Ident::new(
        &format!("{}_{}", name, features.join("_").replace('.', "_")),
        name.span(),
    );

    let mut output = input;

    let mut variant = TokenStream::new();
    for feature in features.iter() {
        let attr: TokenStream = format!("#[target_feature(enable = \"{}\")]", feature)
            .parse()
            .expect("target_feature attribute should tokenize");
        variant.extend(attr);
    }
    variant.extend(tokens.into_iter().enumerate().map(|(i, tt)| {
        if i == name_pos {
            TokenTree::Ident(variant_name.clone())
        } else {
            tt
        }
    }));

    output.extend(variant);
    output
}
