//! GitHub-style task lists: a list item whose paragraph starts with `[ ]`,
//! `[x]` or `[X]` gets a checkbox.
use crate::{
    CoreState, Error, MarkdownParser, Nesting, TaskListOptions, Token, extensions::core_rule,
};

/// # Errors
///
/// Fails if the `inline` core rule was removed.
pub fn register(md: &mut MarkdownParser) -> Result<(), Error> {
    let options = md.options.tasklists.clone();
    md.core.ruler.after(
        "inline",
        "tasklists",
        core_rule(move |state| tasklists(state, &options)),
        &[],
    )
}

/// `Some(checked)` when `content` opens with a task marker.
fn task_marker(content: &str) -> Option<bool> {
    match content.get(..4)? {
        "[ ] " => Some(false),
        "[x] " | "[X] " => Some(true),
        _ => None,
    }
}

fn is_task_item(tokens: &[Token], index: usize) -> bool {
    let Some(before) = index.checked_sub(2) else {
        return false;
    };
    let (Some(item), Some(paragraph), Some(inline)) =
        (tokens.get(before), tokens.get(index - 1), tokens.get(index))
    else {
        return false;
    };
    item.is("list_item_open")
        && paragraph.is("paragraph_open")
        && inline.is("inline")
        && task_marker(&inline.content).is_some()
        && inline
            .children
            .as_ref()
            .and_then(|children| children.first())
            .is_some_and(|first| first.is("text") && task_marker(&first.content).is_some())
}

/// Add `class` to the token's class list unless it is already there.
fn add_class(token: &mut Token, class: &str) {
    let present = token
        .attr_get("class")
        .is_some_and(|classes| classes.split_whitespace().any(|c| c == class));
    if !present {
        token.attr_join("class", class);
    }
}

fn html_inline(content: String) -> Token {
    let mut token = Token::new("html_inline", "", Nesting::SelfClosing);
    token.content = content;
    token
}

fn checkbox(checked: bool, enabled: bool, id: Option<&str>) -> Token {
    let mut html = String::from("<input class=\"task-list-item-checkbox\"");
    if checked {
        html.push_str(" checked=\"checked\"");
    }
    if !enabled {
        html.push_str(" disabled=\"disabled\"");
    }
    html.push_str(" type=\"checkbox\"");
    if let Some(id) = id {
        html.push_str(" id=\"");
        html.push_str(id);
        html.push('"');
    }
    html.push('>');
    html_inline(html)
}

fn todoify(inline: &mut Token, options: &TaskListOptions, next_id: &mut usize) {
    let Some(children) = inline.children.as_mut() else {
        return;
    };
    let Some(first) = children.first_mut() else {
        return;
    };
    let checked = task_marker(&first.content).unwrap_or_default();
    // Keep the space after the marker between the checkbox and the text.
    first.content.replace_range(..3, "");

    let rest = std::mem::take(children);
    let mut out = Vec::with_capacity(rest.len() + 3);
    if options.label && options.label_after {
        *next_id += 1;
        let id = format!("task-item-{next_id}");
        out.push(checkbox(checked, options.enabled, Some(&id)));
        out.push(html_inline(format!(
            "<label class=\"task-list-item-label\" for=\"{id}\">"
        )));
        out.extend(rest);
        out.push(html_inline("</label>".to_string()));
    } else if options.label {
        out.push(html_inline("<label>".to_string()));
        out.push(checkbox(checked, options.enabled, None));
        out.extend(rest);
        out.push(html_inline("</label>".to_string()));
    } else {
        out.push(checkbox(checked, options.enabled, None));
        out.extend(rest);
    }
    *children = out;
}

pub fn tasklists(state: &mut CoreState<'_>, options: &TaskListOptions) {
    let item_class = if options.enabled {
        "task-list-item enabled"
    } else {
        "task-list-item"
    };
    let mut next_id = state.env.task_items;
    for index in 2..state.tokens.len() {
        if !is_task_item(&state.tokens, index) {
            continue;
        }
        if let Some(inline) = state.tokens.get_mut(index) {
            todoify(inline, options, &mut next_id);
        }
        let item_index = index - 2;
        let Some(item_level) = state.tokens.get(item_index).map(|item| item.level) else {
            continue;
        };
        if let Some(item) = state.tokens.get_mut(item_index) {
            for class in item_class.split(' ') {
                add_class(item, class);
            }
        }
        let parent = item_level.checked_sub(1).and_then(|target| {
            state
                .tokens
                .get(..item_index)?
                .iter()
                .rposition(|token| token.level == target && token.nesting == Nesting::Opening)
        });
        if let Some(list) = parent.and_then(|parent| state.tokens.get_mut(parent)) {
            add_class(list, "contains-task-list");
        }
    }
    state.env.task_items = next_id;
}
