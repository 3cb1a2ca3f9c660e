use crate::wheel::{Branding, ConfirmationContent, PrizeOption, Promotion, SpinButtonStyle};

const PODIUM_IMAGE: &str =
    "https://img.freepik.com/premium-vector/pedestal-rewarding-winners-white-podium-platform-with-spotlights_257584-2320.jpg";
const BACKGROUND_IMAGE: &str =
    "https://t3.ftcdn.net/jpg/04/12/82/16/360_F_412821610_95RpjzPXCE2LiWGVShIUCGJSktkJQh6P.jpg";
const FAVICON: &str = "https://cdn-icons-png.flaticon.com/512/4992/4992618.png";

struct Seed {
    text: &'static str,
    weight: f64,
    color: &'static str,
    button: &'static str,
    title: &'static str,
    subtitle: &'static str,
    description: &'static str,
    action: &'static str,
}

const SEEDS: [Seed; 8] = [
    Seed {
        text: "No Prize",
        weight: 12.0,
        color: "#E74C3C",
        button: "#C0392B",
        title: "Not this time!",
        subtitle: "Don't give up, try again!",
        description: "Keep spinning for a chance at amazing prizes!",
        action: "TRY AGAIN",
    },
    Seed {
        text: "10% OFF",
        weight: 30.0,
        color: "#2ECC71",
        button: "#27AE60",
        title: "Congratulations!",
        subtitle: "You won 10% off your next purchase!",
        description: "Use code PRIZE10 at checkout.",
        action: "CLAIM PRIZE",
    },
    Seed {
        text: "25% OFF",
        weight: 15.0,
        color: "#F39C12",
        button: "#E67E22",
        title: "Congratulations!",
        subtitle: "You won 25% off your next purchase!",
        description: "Use code PRIZE25 at checkout.",
        action: "CLAIM PRIZE",
    },
    Seed {
        text: "$5 CREDIT",
        weight: 20.0,
        color: "#3498DB",
        button: "#2980B9",
        title: "Congratulations!",
        subtitle: "You won $5 in store credit!",
        description: "Use code CREDIT5 at checkout.",
        action: "CLAIM PRIZE",
    },
    Seed {
        text: "$10 CREDIT",
        weight: 10.0,
        color: "#9B59B6",
        button: "#8E44AD",
        title: "Congratulations!",
        subtitle: "You won $10 in store credit!",
        description: "Use code CREDIT10 at checkout.",
        action: "CLAIM PRIZE",
    },
    Seed {
        text: "$20 CREDIT",
        weight: 5.0,
        color: "#FF1493",
        button: "#D81B60",
        title: "Congratulations!",
        subtitle: "You won $20 in store credit!",
        description: "Use code CREDIT20 at checkout.",
        action: "CLAIM PRIZE",
    },
    Seed {
        text: "FREE SHIPPING",
        weight: 8.0,
        color: "#1ABC9C",
        button: "#16A085",
        title: "Congratulations!",
        subtitle: "You won free shipping on your next order!",
        description: "Use code FREESHIP at checkout.",
        action: "CLAIM PRIZE",
    },
    Seed {
        text: "SURPRISE GIFT",
        weight: 0.5,
        color: "#FFD700",
        button: "#FFC107",
        title: "Congratulations!",
        subtitle: "You won a surprise gift!",
        description: "Use code SURPRISE at checkout.",
        action: "CLAIM PRIZE",
    },
];

impl Seed {
    fn option(&self) -> PrizeOption {
        // dark label on the gold sector
        let label = if self.color == "#FFD700" { "#000000" } else { "#FFFFFF" };
        PrizeOption {
            text: self.text.to_string(),
            weight: self.weight,
            color: self.color.to_string(),
            text_color: label.to_string(),
            confirmation: ConfirmationContent {
                title: self.title.to_string(),
                title_color: self.color.to_string(),
                subtitle: self.subtitle.to_string(),
                subtitle_color: self.color.to_string(),
                description: self.description.to_string(),
                description_color: "#333333".to_string(),
                button_text: self.action.to_string(),
                button_text_color: label.to_string(),
                button_background: self.button.to_string(),
                background_color: "#FFFFFF".to_string(),
                background_image: PODIUM_IMAGE.to_string(),
                link_to: "#".to_string(),
            },
        }
    }
}

impl Promotion {
    /// A ready-to-spin wheel with the stock branding and eight sample prizes.
    pub fn starter(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            description: "Spin the wheel and win amazing prizes!".to_string(),
            favicon_url: FAVICON.to_string(),
            branding: Branding {
                background_color: "#FFFFFF".to_string(),
                background_image: BACKGROUND_IMAGE.to_string(),
                logo_image: String::new(),
                title_color: "#000000".to_string(),
                description_color: "#333333".to_string(),
                spin_button: SpinButtonStyle {
                    text: "Spin the Wheel".to_string(),
                    text_color: "#FFFFFF".to_string(),
                    background: "#E74C3C".to_string(),
                },
            },
            options: SEEDS.iter().map(Seed::option).collect(),
        }
    }
}
