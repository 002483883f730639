use ratatui::style::{Color, palette::tailwind};

pub struct DashboardColors {
    pub buffer_bg: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub row_fg: Color,
    pub muted_fg: Color,
    pub selected_bg: Color,
    pub focus_border: Color,
    pub idle_border: Color,
    pub footer_border_color: Color,
    pub positive: Color,
    pub negative: Color,
    pub hovered: Color,
    pub zero_line: Color,
    pub favorite: Color,
}

impl DashboardColors {
    pub const fn new(color: &tailwind::Palette) -> Self {
        Self {
            buffer_bg: tailwind::SLATE.c950,
            header_bg: color.c900,
            header_fg: tailwind::SLATE.c200,
            row_fg: tailwind::SLATE.c200,
            muted_fg: tailwind::SLATE.c500,
            selected_bg: color.c900,
            focus_border: color.c400,
            idle_border: tailwind::SLATE.c700,
            footer_border_color: color.c400,
            positive: tailwind::GREEN.c400,
            negative: tailwind::RED.c400,
            hovered: tailwind::AMBER.c300,
            zero_line: tailwind::SLATE.c200,
            favorite: tailwind::YELLOW.c400,
        }
    }

    /// Non-negative rates share one color, negative rates another.
    pub fn funding_rate_color(&self, funding: f64) -> Color {
        if funding < 0.0 {
            self.negative
        } else {
            self.positive
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_funding_rate_color_by_sign() {
        let colors = DashboardColors::new(&tailwind::BLUE);
        assert_eq!(colors.funding_rate_color(0.0001), colors.positive);
        assert_eq!(colors.funding_rate_color(0.0), colors.positive);
        assert_eq!(colors.funding_rate_color(-0.0001), colors.negative);
    }
}
