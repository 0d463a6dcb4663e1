use std::fmt::Write;

use dealhound_models::estimate::SimilarItem;

use crate::oracle::ChatMessage;

pub const SYSTEM_MESSAGE: &str =
    "You estimate prices of items. Reply only with the price, no explanation";

/// Primes the assistant turn so the model continues with a bare number.
pub const PRICE_PREFIX: &str = "Price is $";

/// Context block listing similar products and their known prices.
pub fn make_context(similars: &[SimilarItem]) -> String {
    let mut message = String::from(
        "To provide some context, here are some other items that might be similar \
         to the item you need to estimate.\n\n",
    );
    for item in similars {
        let _ = write!(
            message,
            "Potentially related product:\n{}\nPrice is ${:.2}\n\n",
            item.text, item.price
        );
    }
    message
}

/// System instruction, user prompt with context, and the primed assistant prefix.
pub fn messages_for(description: &str, similars: &[SimilarItem]) -> Vec<ChatMessage> {
    let mut user_prompt = make_context(similars);
    user_prompt.push_str("And now the question for you:\n\n");
    user_prompt.push_str("How much does this cost?\n\n");
    user_prompt.push_str(description);

    vec![
        ChatMessage::system(SYSTEM_MESSAGE),
        ChatMessage::user(user_prompt),
        ChatMessage::assistant(PRICE_PREFIX),
    ]
}
