use ratatui::layout::{Constraint, Direction, Layout, Rect};

use super::panel::{Panel, PanelType};

const TOPBAR_HEIGHT: u16 = 1;
const STATUS_HEIGHT: u16 = 3;
const MIN_WIDGETS_WIDTH: u16 = 30;
const CARD_HEIGHT: u16 = 5;

#[derive(Default)]
pub struct LayoutState {
    cached_panels: Vec<Panel>,
    card_rects: Vec<Rect>,
}

impl LayoutState {
    pub fn calculate_layout(&mut self, area: Rect, card_count: usize) -> &[Panel] {
        let main_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(TOPBAR_HEIGHT),
                Constraint::Min(1),
                Constraint::Length(STATUS_HEIGHT),
            ])
            .split(area);

        let content_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(MIN_WIDGETS_WIDTH),
                Constraint::Percentage(55),
            ])
            .split(main_layout[1]);

        let mut card_constraints = vec![Constraint::Length(CARD_HEIGHT); card_count];
        card_constraints.push(Constraint::Min(0));
        let cards = Layout::default()
            .direction(Direction::Vertical)
            .constraints(card_constraints)
            .split(content_layout[0]);
        self.card_rects = cards.iter().take(card_count).copied().collect();

        self.cached_panels = vec![
            Panel {
                panel_type: PanelType::Topbar,
                rect: main_layout[0],
            },
            Panel {
                panel_type: PanelType::Widgets,
                rect: content_layout[0],
            },
            Panel {
                panel_type: PanelType::Items,
                rect: content_layout[1],
            },
            Panel {
                panel_type: PanelType::StatusBar,
                rect: main_layout[2],
            },
        ];

        &self.cached_panels
    }

    pub fn get_panels(&self) -> &[Panel] {
        &self.cached_panels
    }

    pub fn card_rects(&self) -> &[Rect] {
        &self.card_rects
    }

    /// Index of the widget card under the given cell.
    pub fn card_at(&self, col: u16, row: u16) -> Option<usize> {
        self.card_rects.iter().position(|rect| {
            col >= rect.x
                && col < rect.x + rect.width
                && row >= rect.y
                && row < rect.y + rect.height
        })
    }
}
