use proc_macro2::TokenStream as TokenStream2;
use syn::{
	Token,
	parse::{self, Parse, ParseStream},
};

/// Arguments of `#[context(...)]`: an optional leading `move,` followed by `format!` arguments.
#[derive(Debug)]
pub struct Args {
	pub move_token: Option<Token![move]>,
	pub format_args: TokenStream2,
}

impl Parse for Args {
	fn parse(input: ParseStream<'_>) -> parse::Result<Self> {
		let move_token = if input.peek(Token![move]) {
			let token = input.parse()?;
			input.parse::<Token![,]>()?;
			Some(token)
		} else {
			None
		};
		Ok(Self {
			move_token,
			format_args: input.parse()?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::Args;
	use syn::parse_str;

	#[test]
	fn plain_message() {
		let args: Args = parse_str("\"opening database\"").unwrap();
		assert!(args.move_token.is_none());
		assert_eq!(args.format_args.to_string(), "\"opening database\"");
	}

	#[test]
	fn message_with_arguments() {
		let args: Args = parse_str("\"putting {:?} into region {}\", resource, region_id").unwrap();
		assert!(args.move_token.is_none());
		assert_eq!(
			args.format_args.to_string(),
			"\"putting {:?} into region {}\" , resource , region_id"
		);
	}

	#[test]
	fn leading_move() {
		let args: Args = parse_str("move, \"deleting region {}\", id").unwrap();
		assert!(args.move_token.is_some());
		assert_eq!(args.format_args.to_string(), "\"deleting region {}\" , id");
	}

	#[test]
	fn move_without_comma_is_rejected() {
		let err = parse_str::<Args>("move \"x\"").unwrap_err();
		assert!(err.to_string().contains(','), "unexpected error: {err}");
	}
}
