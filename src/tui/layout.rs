use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};

pub struct Layout {
    pub inner_area: Rect, // Area inside the outer border
    pub tabs_area: Rect,
    pub main_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Width fits the 28-column month grid beside the entry list.
    /// Height fits tabs, a six-week month and the status line.
    pub const MIN_WIDTH: u16 = 60;
    pub const MIN_HEIGHT: u16 = 14;

    pub fn calculate(size: Rect) -> Self {
        let width = size.width.max(Self::MIN_WIDTH + 2);
        let height = size.height.max(Self::MIN_HEIGHT + 2);
        let size = Rect::new(size.x, size.y, width, height);

        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            size.width.saturating_sub(2),
            size.height.saturating_sub(2),
        );

        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Tabs
                Constraint::Min(1),    // Content
                Constraint::Length(1), // Status
            ])
            .split(inner_area);

        Self {
            inner_area,
            tabs_area: vertical[0],
            main_area: vertical[1],
            status_area: vertical[2],
        }
    }

    /// Split the content area into a left and right pane
    pub fn split_main(&self, left_percent: u16) -> (Rect, Rect) {
        let panes = RatLayout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(left_percent),
                Constraint::Percentage(100 - left_percent.min(100)),
            ])
            .split(self.main_area);
        (panes[0], panes[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn areas_stack_inside_border() {
        let layout = Layout::calculate(Rect::new(0, 0, 80, 24));
        assert_eq!(layout.inner_area, Rect::new(1, 1, 78, 22));
        assert_eq!(layout.tabs_area.height, 1);
        assert_eq!(layout.status_area.height, 1);
        assert_eq!(layout.main_area.height, 20);
        assert_eq!(layout.status_area.y, 22);
    }

    #[test]
    fn tiny_terminals_are_padded_to_minimum() {
        let layout = Layout::calculate(Rect::new(0, 0, 10, 5));
        assert_eq!(layout.inner_area.width, Layout::MIN_WIDTH);
        assert_eq!(layout.inner_area.height, Layout::MIN_HEIGHT);
    }
}
