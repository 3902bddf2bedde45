//! The PCode opcode mnemonic table (Ext in the layer table): declarative input to
//! the disassembler, external to the core per the spec.
//!
//! The table is built once from a macro-driven list of the historically named
//! opcodes and padded out to the full 380-entry range with placeholder zero-arg
//! mnemonics for slots this inspector has no name for. Indices are load-bearing:
//! never renumber an entry once assigned.

use std::sync::OnceLock;

/// How an opcode's immediate arguments are encoded, mirroring the argument
/// classes in §4.6 of the spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// No immediates.
    None,
    /// A fixed count of 4-byte integers (the "default" class): the usual case for
    /// opcodes the static table declares a non-zero arg count for.
    Fixed(u8),
    /// One integer, one byte wide in `small_code` mode, else 4 bytes.
    ScaledInt,
    /// `LSPECnDIRECT`: opcode id (scaled width) followed by `n` 4-byte integers.
    LspecDirect(u8),
    /// `LSPECnDIRECTB`: `1 + n` bytes, all byte-wide regardless of `small_code`.
    LspecDirectB(u8),
    /// `PUSHBYTE` / `DELAYDIRECTB`: one byte.
    OneByte,
    /// `PUSH2BYTES` .. `PUSH5BYTES` / `RANDOMDIRECTB`: a fixed run of bytes.
    ByteRun(u8),
    /// `PUSHBYTES`: `count: u8` followed by `count` bytes.
    PushBytes,
    /// `CASEGOTOSORTED`: segment-relative 4-byte alignment padding, `count: i32`,
    /// then `count` `(value: i32, target: i32)` pairs.
    CaseGotoSorted,
    /// `CALLFUNC`: `(num_args: u8, index: i16)` if `small_code`, else
    /// `(num_args: i32, index: i32)`.
    CallFunc,
}

#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
    pub mnemonic: &'static str,
    pub args: ArgKind,
}

/// Total size of the mnemonic table. The spec fixes the first 380 entries.
pub const OPCODE_COUNT: usize = 380;

macro_rules! op_table {
    ( $( $id:literal => ($mnemonic:expr, $args:expr) ),* $(,)? ) => {{
        let mut table: Vec<OpcodeInfo> = (0..OPCODE_COUNT)
            .map(|id| OpcodeInfo { mnemonic: Box::leak(format!("unknown_{id}").into_boxed_str()), args: ArgKind::None })
            .collect();
        $(
            table[$id] = OpcodeInfo { mnemonic: $mnemonic, args: $args };
        )*
        table
    }};
}

fn build_table() -> Vec<OpcodeInfo> {
    use ArgKind::*;
    op_table! {
        0 => ("nop", None),
        1 => ("terminate", None),
        2 => ("suspend", None),
        3 => ("pushnumber", Fixed(1)),
        4 => ("lspec1", ScaledInt),
        5 => ("lspec2", ScaledInt),
        6 => ("lspec3", ScaledInt),
        7 => ("lspec4", ScaledInt),
        8 => ("lspec5", ScaledInt),
        9 => ("lspec1direct", LspecDirect(1)),
        10 => ("lspec2direct", LspecDirect(2)),
        11 => ("lspec3direct", LspecDirect(3)),
        12 => ("lspec4direct", LspecDirect(4)),
        13 => ("lspec5direct", LspecDirect(5)),
        14 => ("add", None),
        15 => ("subtract", None),
        16 => ("multiply", None),
        17 => ("divide", None),
        18 => ("modulus", None),
        19 => ("eq", None),
        20 => ("ne", None),
        21 => ("lt", None),
        22 => ("gt", None),
        23 => ("le", None),
        24 => ("ge", None),
        25 => ("assignscriptvar", ScaledInt),
        26 => ("assignmapvar", ScaledInt),
        27 => ("assignworldvar", ScaledInt),
        28 => ("pushscriptvar", ScaledInt),
        29 => ("pushmapvar", ScaledInt),
        30 => ("pushworldvar", ScaledInt),
        31 => ("addscriptvar", ScaledInt),
        32 => ("addmapvar", ScaledInt),
        33 => ("addworldvar", ScaledInt),
        34 => ("subscriptvar", ScaledInt),
        35 => ("submapvar", ScaledInt),
        36 => ("subworldvar", ScaledInt),
        37 => ("mulscriptvar", ScaledInt),
        38 => ("mulmapvar", ScaledInt),
        39 => ("mulworldvar", ScaledInt),
        40 => ("divscriptvar", ScaledInt),
        41 => ("divmapvar", ScaledInt),
        42 => ("divworldvar", ScaledInt),
        43 => ("modscriptvar", ScaledInt),
        44 => ("modmapvar", ScaledInt),
        45 => ("modworldvar", ScaledInt),
        46 => ("incscriptvar", ScaledInt),
        47 => ("incmapvar", ScaledInt),
        48 => ("incworldvar", ScaledInt),
        49 => ("decscriptvar", ScaledInt),
        50 => ("decmapvar", ScaledInt),
        51 => ("decworldvar", ScaledInt),
        52 => ("goto", Fixed(1)),
        53 => ("ifgoto", Fixed(1)),
        54 => ("drop", None),
        55 => ("delay", None),
        56 => ("delaydirect", OneByte),
        57 => ("random", None),
        58 => ("randomdirect", ByteRun(2)),
        59 => ("thingcount", None),
        60 => ("thingcountdirect", Fixed(2)),
        61 => ("tagwait", None),
        62 => ("tagwaitdirect", Fixed(1)),
        63 => ("polywait", None),
        64 => ("polywaitdirect", Fixed(1)),
        65 => ("changefloor", None),
        66 => ("changefloordirect", Fixed(2)),
        67 => ("changeceiling", None),
        68 => ("changeceilingdirect", Fixed(2)),
        69 => ("restart", None),
        70 => ("andlogical", None),
        71 => ("orlogical", None),
        72 => ("andbitwise", None),
        73 => ("orbitwise", None),
        74 => ("eorbitwise", None),
        75 => ("negatelogical", None),
        76 => ("lshift", None),
        77 => ("rshift", None),
        78 => ("unaryminus", None),
        79 => ("ifnotgoto", Fixed(1)),
        80 => ("lineside", None),
        81 => ("scriptwait", None),
        82 => ("scriptwaitdirect", Fixed(1)),
        83 => ("clearlinespecial", None),
        84 => ("casegoto", Fixed(2)),
        85 => ("beginprint", None),
        86 => ("endprint", None),
        87 => ("printstring", None),
        88 => ("printnumber", None),
        89 => ("printcharacter", None),
        90 => ("playercount", None),
        91 => ("gametype", None),
        92 => ("ambientsound", Fixed(2)),
        93 => ("timer", None),
        94 => ("sectorsound", Fixed(2)),
        // id 106 intentionally duplicates id 92's mnemonic -- see Open Question in
        // the design notes, preserved rather than renamed.
        106 => ("ambientsound", None),
        95 => ("soundsequence", None),
        96 => ("setlinetexture", None),
        97 => ("setlineblocking", None),
        98 => ("setlinespecial", None),
        99 => ("thingsound", None),
        100 => ("endprintbold", None),
        101 => ("activatorsound", None),
        102 => ("localambientsound", None),
        103 => ("setlinemonsterblocking", None),
        104 => ("playerblueskull", None),
        105 => ("playerredskull", None),
        107 => ("setactorangle", None),
        108 => ("spawnprojectile", Fixed(6)),
        109 => ("getsectorlightlevel", None),
        110 => ("getactorceilingz", None),
        111 => ("setactorposition", None),
        112 => ("clearactorinventory", None),
        113 => ("giveactorinventory", None),
        114 => ("takeactorinventory", None),
        115 => ("checkactorinventory", None),
        116 => ("spawn", Fixed(6)),
        117 => ("spawndirect", Fixed(6)),
        118 => ("spawnspot", Fixed(4)),
        119 => ("spawnspotdirect", Fixed(4)),
        120 => ("setmusic", None),
        121 => ("setmusicdirect", Fixed(3)),
        122 => ("localsetmusic", None),
        123 => ("localsetmusicdirect", Fixed(3)),
        124 => ("printfixed", None),
        125 => ("printlocalized", None),
        126 => ("morehudmessage", None),
        127 => ("opthudmessage", None),
        128 => ("endhudmessage", None),
        129 => ("endhudmessagebold", None),
        130 => ("setstyle", None),
        131 => ("setstyledirect", Fixed(1)),
        132 => ("setfont", None),
        133 => ("setfontdirect", Fixed(1)),
        134 => ("pushbyte", OneByte),
        135 => ("lspec1directb", LspecDirectB(1)),
        136 => ("lspec2directb", LspecDirectB(2)),
        137 => ("lspec3directb", LspecDirectB(3)),
        138 => ("lspec4directb", LspecDirectB(4)),
        139 => ("lspec5directb", LspecDirectB(5)),
        140 => ("delaydirectb", OneByte),
        141 => ("randomdirectb", ByteRun(2)),
        142 => ("pushbytes", PushBytes),
        143 => ("push2bytes", ByteRun(2)),
        144 => ("push3bytes", ByteRun(3)),
        145 => ("push4bytes", ByteRun(4)),
        146 => ("push5bytes", ByteRun(5)),
        147 => ("setthingspecial", None),
        148 => ("assignglobalvar", ScaledInt),
        149 => ("pushglobalvar", ScaledInt),
        150 => ("addglobalvar", ScaledInt),
        151 => ("subglobalvar", ScaledInt),
        152 => ("mulglobalvar", ScaledInt),
        153 => ("divglobalvar", ScaledInt),
        154 => ("modglobalvar", ScaledInt),
        155 => ("incglobalvar", ScaledInt),
        156 => ("decglobalvar", ScaledInt),
        157 => ("fadeto", None),
        158 => ("fadecrange", None),
        159 => ("cancelfade", None),
        160 => ("playmovie", None),
        161 => ("settranslation", None),
        162 => ("endprintlog", None),
        163 => ("inventorycheckstring", None),
        164 => ("casegotosorted", CaseGotoSorted),
        165 => ("setresultvalue", None),
        166 => ("getlinerowoffset", None),
        167 => ("getactorfloorz", None),
        168 => ("getactorangle", None),
        169 => ("getsectorfloorz", None),
        170 => ("getsectorceilingz", None),
        171 => ("lspec5result", ScaledInt),
        172 => ("getsigilpieces", None),
        173 => ("getlevelinfo", None),
        174 => ("changesky", None),
        175 => ("playeringame", None),
        176 => ("playerisbot", None),
        177 => ("setcameratotexture", None),
        178 => ("endlog", None),
        179 => ("getammocapacity", None),
        180 => ("setammocapacity", None),
        181 => ("printmapcharacter", None),
        182 => ("printmapname", None),
        183 => ("musicchange", None),
        184 => ("consolecommanddirect", Fixed(3)),
        185 => ("consolecommand", None),
        186 => ("singleplayer", None),
        187 => ("fixedmul", None),
        188 => ("fixeddiv", None),
        189 => ("setgravity", None),
        190 => ("setgravitydirect", None),
        191 => ("setaircontrol", None),
        192 => ("setaircontroldirect", None),
        193 => ("clearinventory", None),
        194 => ("giveinventory", None),
        195 => ("giveinventorydirect", None),
        196 => ("takeinventory", None),
        197 => ("takeinventorydirect", None),
        198 => ("checkinventory", None),
        199 => ("checkinventorydirect", None),
        200 => ("spawn2", Fixed(6)),
        201 => ("spawn2direct", Fixed(6)),
        202 => ("spawnspot2", Fixed(4)),
        203 => ("spawnspot2direct", Fixed(4)),
        204 => ("setmusic2", None),
        205 => ("setmusic2direct", Fixed(3)),
        206 => ("localsetmusic2", None),
        207 => ("localsetmusic2direct", Fixed(3)),
        208 => ("printtype", None),
        209 => ("printtypedirect", None),
        210 => ("unloadtranslation", None),
        211 => ("alerttype", None),
        212 => ("settranslationspec", None),
        213 => ("getplayerinput", None),
        214 => ("classifyactor", None),
        215 => ("printbind", None),
        216 => ("call", ScaledInt),
        217 => ("calldiscard", ScaledInt),
        218 => ("returnval", None),
        219 => ("returnvoid", None),
        220 => ("pushfunction", ScaledInt),
        221 => ("callfunc", CallFunc),
        222 => ("swap", None),
        223 => ("writetoini", None),
        224 => ("getfromini", None),
        225 => ("sin", None),
        226 => ("cos", None),
        227 => ("vectorangle", None),
        228 => ("checkweapon", None),
        229 => ("setweapon", None),
        230 => ("tagstring", None),
        231 => ("push3bytesb", ByteRun(3)),
        232 => ("banlist", None),
        233 => ("endlog2", None),
        234 => ("saveloaded", None),
        235 => ("singleplayer2", None),
        236 => ("getteamscore", None),
        237 => ("setteamscore", None),
        238 => ("setgravitypct", None),
        239 => ("getinvasionwave", None),
        240 => ("getinvasionstate", None),
        241 => ("printname", None),
        242 => ("musicchange2", None),
        243 => ("consolecommand2", None),
        244 => ("singleplayer3", None),
        245 => ("fixedmul2", None),
        246 => ("fixeddiv2", None),
        247 => ("setgravity2", None),
        248 => ("setaircontrol2", None),
        249 => ("clearinventory2", None),
        250 => ("giveinventory2", None),
    }
}

static TABLE: OnceLock<Vec<OpcodeInfo>> = OnceLock::new();

/// Looks up an opcode's metadata, built lazily once on first use.
pub fn lookup(opcode: u32) -> Option<&'static OpcodeInfo> {
    let table = TABLE.get_or_init(build_table);
    table.get(opcode as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_every_index() {
        assert_eq!(lookup(0).unwrap().mnemonic, "nop");
        assert!(lookup(OPCODE_COUNT as u32 - 1).is_some());
        assert!(lookup(OPCODE_COUNT as u32).is_none());
    }

    #[test]
    fn ambientsound_duplicate_is_preserved() {
        assert_eq!(lookup(92).unwrap().mnemonic, "ambientsound");
        assert_eq!(lookup(106).unwrap().mnemonic, "ambientsound");
    }

    #[test]
    fn unnamed_slots_get_a_placeholder_mnemonic() {
        let info = lookup(300).unwrap();
        assert_eq!(info.mnemonic, "unknown_300");
        assert_eq!(info.args, ArgKind::None);
    }
}
