/// Pads of the i.MX6 SoloLite that can be muxed to a GPIO line.
///
/// The IOMUX word of each pad is kept as-is from the SoC pin table; this crate never decodes it,
/// it only hands it out to whoever programs the mux. The pad name is accepted wherever a pin name
/// is, and resolves to the GPIO line the pad is routed to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PadId {
    Ecspi1Ss0,
    FecRxEr,
    FecTxClk,
}

const fn iomux_pad(
    pad_ctrl_ofs: u64,
    mux_ctrl_ofs: u64,
    mux_mode: u64,
    sel_input_ofs: u64,
    sel_input: u64,
    pad_ctrl: u64,
) -> u64 {
    mux_ctrl_ofs
        | (pad_ctrl_ofs << 12)
        | (sel_input_ofs << 24)
        | (mux_mode << 36)
        | (pad_ctrl << 41)
        | (sel_input << 58)
}

impl PadId {
    pub const ALL: [PadId; 3] = [PadId::Ecspi1Ss0, PadId::FecRxEr, PadId::FecTxClk];

    pub fn name(self) -> &'static str {
        use PadId::*;
        match self {
            Ecspi1Ss0 => "ECSPI1_SS0",
            FecRxEr => "FEC_RX_ER",
            FecTxClk => "FEC_TX_CLK",
        }
    }

    /// Name of the GPIO line this pad is routed to in its GPIO mux mode.
    pub fn gpio_line(self) -> &'static str {
        use PadId::*;
        match self {
            Ecspi1Ss0 => "GPIO4_11",
            FecRxEr => "GPIO4_19",
            FecTxClk => "GPIO4_21",
        }
    }

    pub fn iomux(self) -> u64 {
        use PadId::*;
        match self {
            Ecspi1Ss0 => iomux_pad(0x0364, 0x0074, 5, 0x0000, 0, 0),
            FecRxEr => iomux_pad(0x0428, 0x0138, 5, 0x0000, 0, 0),
            FecTxClk => iomux_pad(0x0434, 0x0144, 5, 0x0000, 0, 0),
        }
    }

    pub fn find(name: &str) -> Option<PadId> {
        Self::ALL
            .iter()
            .copied()
            .find(|pad| pad.name().eq_ignore_ascii_case(name))
    }
}
