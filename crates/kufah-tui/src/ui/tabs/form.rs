use ratatui::{
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

const FORM_WIDTH: u16 = 64;
const LABEL_WIDTH: usize = 18;

pub fn render(frame: &mut Frame, app: &App) {
    let Some(form) = &app.form else {
        return;
    };

    let value_width = FORM_WIDTH as usize - LABEL_WIDTH - 6;
    let mut lines = vec![Line::from("")];

    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focus;
        // Show the tail of long values so the cursor stays visible
        let count = field.value.chars().count();
        let shown: String = field.value.chars().skip(count.saturating_sub(value_width - 1)).collect();
        let cursor = if focused { "▌" } else { "" };

        lines.push(Line::from(vec![
            Span::styled(
                format!(" {:<width$}", field.label, width = LABEL_WIDTH),
                if focused { styles::highlight_style() } else { styles::muted_style() },
            ),
            Span::styled(format!("{}{}", shown, cursor), styles::input_style(focused)),
        ]));
        if !field.hint.is_empty() {
            lines.push(Line::from(Span::styled(
                format!(" {:<width$}{}", "", field.hint, width = LABEL_WIDTH),
                styles::muted_style(),
            )));
        }
    }

    lines.push(Line::from(""));
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(vec![
        Span::styled(" [Enter]", styles::help_key_style()),
        Span::styled(" save  ", styles::help_desc_style()),
        Span::styled("[Tab]", styles::help_key_style()),
        Span::styled(" next field  ", styles::help_desc_style()),
        Span::styled("[Esc]", styles::help_key_style()),
        Span::styled(" cancel", styles::help_desc_style()),
    ]));

    let height = lines.len() as u16 + 2;
    let area = centered_rect_fixed(FORM_WIDTH, height, frame.area());
    frame.render_widget(Clear, area);

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(format!(" {} ", form.kind.title()))
            .title_style(styles::title_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(true)),
    );
    frame.render_widget(paragraph, area);
}
