/// Gate consulted before a deletion.
///
/// `true`/`false` answer every prompt the same way; a closure can ask the
/// user.
pub trait ConfirmDelete {
    fn confirm(&self, prompt: &str) -> bool;
}

impl ConfirmDelete for bool {
    fn confirm(&self, _prompt: &str) -> bool {
        *self
    }
}

impl<F> ConfirmDelete for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

pub(crate) const DELETE_INVOICE_PROMPT: &str = "Are you sure you want to delete this invoice?";
pub(crate) const DELETE_TEMPLATE_PROMPT: &str = "Are you sure you want to delete this template?";
pub(crate) const DELETE_DRAFT_PROMPT: &str = "Are you sure you want to delete this draft?";

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn bool_answers_every_prompt() {
        assert!(true.confirm("anything"));
        assert!(!false.confirm("anything"));
    }

    #[test]
    fn closure_sees_the_prompt() {
        let seen = RefCell::new(Vec::new());
        let gate = |prompt: &str| {
            seen.borrow_mut().push(prompt.to_string());
            prompt.contains("draft")
        };

        assert!(gate.confirm(DELETE_DRAFT_PROMPT));
        assert!(!gate.confirm(DELETE_INVOICE_PROMPT));
        assert_eq!(seen.borrow().len(), 2);
    }
}
